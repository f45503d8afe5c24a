//! Published context frames

use context_types::EditorContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a context host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostId(Uuid);

impl HostId {
    /// Creates a new unique host ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for HostId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host:{}", self.0)
    }
}

/// Context frame - immutable snapshot as published by a host
///
/// Cloning a frame shares the context; readers never copy buffer content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFrame {
    /// Host that published this frame
    pub host_id: HostId,
    /// Monotonic revision number (starts at 1)
    pub revision: u64,
    /// The snapshot itself
    pub context: Arc<EditorContext>,
}

impl ContextFrame {
    pub fn new(host_id: HostId, revision: u64, context: EditorContext) -> Self {
        Self {
            host_id,
            revision,
            context: Arc::new(context),
        }
    }

    /// Checks if this frame supersedes another frame of the same host
    pub fn is_newer_than(&self, other: &ContextFrame) -> bool {
        self.host_id == other.host_id && self.revision > other.revision
    }
}
