//! Context error types

use crate::validate::Inconsistency;
use thiserror::Error;

/// Result type for context decoding and validation
pub type ContextResult<T> = Result<T, ContextError>;

/// Errors raised at the serialization boundary
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The value does not have the shape of an editor context
    #[error("Malformed context: {reason}")]
    MalformedContext { reason: String },

    /// The value is well-formed but violates a snapshot invariant
    #[error("Inconsistent context: {}", list(.0))]
    InconsistentContext(Vec<Inconsistency>),
}

impl ContextError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        ContextError::MalformedContext {
            reason: reason.into(),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ContextError::MalformedContext { .. })
    }

    pub fn is_inconsistent(&self) -> bool {
        matches!(self, ContextError::InconsistentContext(_))
    }

    /// Returns the violated invariants, if this is an inconsistency error
    pub fn inconsistencies(&self) -> &[Inconsistency] {
        match self {
            ContextError::InconsistentContext(found) => found,
            ContextError::MalformedContext { .. } => &[],
        }
    }
}

impl From<serde_json::Error> for ContextError {
    fn from(err: serde_json::Error) -> Self {
        ContextError::malformed(err.to_string())
    }
}

fn list(found: &[Inconsistency]) -> String {
    found
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
