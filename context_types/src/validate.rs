//! Snapshot invariants and the policy applied when they are violated
//!
//! Structural problems never reach this module; they fail in the codec as
//! `MalformedContext`. What is checked here are semantic inconsistencies of
//! an otherwise well-formed snapshot:
//!
//! - the focused buffer must be shown whenever anything is shown
//! - every shown buffer needs an entry in `buffers` (possibly unset)
//! - a buffer is shown at most once
//!
//! Terminal size is unsigned by type and snapshots are immutable, so the
//! remaining invariants need no runtime check.

use crate::buffer::BufferEntry;
use crate::context::EditorContext;
use crate::error::{ContextError, ContextResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, warn};

/// A violated snapshot invariant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Inconsistency {
    /// Buffers are shown but the focused one is not among them
    FocusNotShown { focus: String },
    /// A shown buffer has no entry in the buffer map
    MissingBufferEntry { id: String },
    /// A buffer appears more than once in the display order
    DuplicateShownBuffer { id: String },
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inconsistency::FocusNotShown { focus } => {
                write!(f, "focused buffer {:?} is not shown", focus)
            }
            Inconsistency::MissingBufferEntry { id } => {
                write!(f, "shown buffer {:?} has no entry", id)
            }
            Inconsistency::DuplicateShownBuffer { id } => {
                write!(f, "buffer {:?} is shown more than once", id)
            }
        }
    }
}

impl EditorContext {
    /// Lists every violated invariant
    ///
    /// Order is stable: duplicates, then missing entries in display order,
    /// then focus.
    pub fn inconsistencies(&self) -> Vec<Inconsistency> {
        let shown = self.buffers_to_show();
        let mut found = Vec::new();

        let mut seen = BTreeSet::new();
        let mut duplicated = BTreeSet::new();
        for id in shown {
            if !seen.insert(id.as_str()) && duplicated.insert(id.as_str()) {
                found.push(Inconsistency::DuplicateShownBuffer { id: id.clone() });
            }
        }

        let mut missing = BTreeSet::new();
        for id in shown {
            if !self.buffers().contains_key(id) && missing.insert(id.as_str()) {
                found.push(Inconsistency::MissingBufferEntry { id: id.clone() });
            }
        }

        if !shown.is_empty() && !self.is_visible(self.focus_buffer()) {
            found.push(Inconsistency::FocusNotShown {
                focus: self.focus_buffer().to_string(),
            });
        }

        found
    }

    pub fn is_consistent(&self) -> bool {
        self.inconsistencies().is_empty()
    }
}

/// How a consumer treats inconsistent snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Reject with `InconsistentContext`
    #[default]
    Strict,
    /// Repair and report what was changed
    Lenient,
}

impl ValidationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationPolicy::Strict => "strict",
            ValidationPolicy::Lenient => "lenient",
        }
    }

    /// Applies the policy to a structurally valid snapshot
    pub fn enforce(&self, context: EditorContext) -> ContextResult<Validated> {
        match self {
            ValidationPolicy::Strict => {
                let found = context.inconsistencies();
                if found.is_empty() {
                    Ok(Validated::clean(context))
                } else {
                    debug!(count = found.len(), policy = self.as_str(), "rejecting snapshot");
                    Err(ContextError::InconsistentContext(found))
                }
            }
            ValidationPolicy::Lenient => {
                let (context, repairs) = repair(context);
                Ok(Validated { context, repairs })
            }
        }
    }
}

impl fmt::Display for ValidationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot that passed validation, with the repairs applied to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validated {
    pub context: EditorContext,
    /// Invariants that were violated and fixed (always empty under strict)
    pub repairs: Vec<Inconsistency>,
}

impl Validated {
    fn clean(context: EditorContext) -> Self {
        Self {
            context,
            repairs: Vec::new(),
        }
    }

    pub fn was_repaired(&self) -> bool {
        !self.repairs.is_empty()
    }

    pub fn into_context(self) -> EditorContext {
        self.context
    }
}

/// Repairs a snapshot so that every invariant holds
///
/// Later duplicates are dropped from the display order, shown ids without
/// an entry get an unset entry, and a focus outside the display order moves
/// to the first shown buffer with resolved context (or the first shown
/// buffer at all).
pub fn repair(mut context: EditorContext) -> (EditorContext, Vec<Inconsistency>) {
    let found = context.inconsistencies();
    if found.is_empty() {
        return (context, found);
    }

    let (buffers, shown, focus) = context.parts_mut();

    let mut seen = BTreeSet::new();
    shown.retain(|id| seen.insert(id.clone()));

    for id in shown.iter() {
        buffers.entry(id.clone()).or_insert(BufferEntry::Unset);
    }

    if !shown.is_empty() && !shown.contains(&*focus) {
        let target = shown
            .iter()
            .find(|id| buffers.get(*id).is_some_and(BufferEntry::is_present))
            .or_else(|| shown.first())
            .cloned();
        if let Some(target) = target {
            *focus = target;
        }
    }

    for issue in &found {
        warn!(reason = %issue, "repaired inconsistent snapshot");
    }

    (context, found)
}
