//! # Editor State
//!
//! The editor core's authoritative state and the producer side of editor
//! contexts.
//!
//! ## Philosophy
//!
//! - **Consistent by construction**: Every operation preserves the context invariants
//! - **Snapshots are detached**: A produced context never aliases live state
//! - **Explicit errors**: Invalid operations fail with a typed error, state is untouched
//! - **Revisioned**: Every observable change bumps a monotonic revision
//!
//! ## Design
//!
//! The crate provides:
//! - EditorBuffer: Live buffer state, including fields that never leave the core
//! - EditorState: Buffers, display order, focus, mode, terminal size and history
//! - StateError: Why an operation was refused

pub mod buffer;
pub mod state;

pub use buffer::{CursorForm, EditorBuffer, EditorCursor};
pub use state::{EditorState, StateError};
