//! # Context Types
//!
//! This crate defines the editor context: the snapshot of editor state that
//! the editor core hands to presentation clients.
//!
//! ## Philosophy
//!
//! - **Snapshots, not patches**: Each context fully replaces the previous one
//! - **Immutable**: A context is never modified after construction
//! - **Explicit absence**: Registered-but-unresolved buffers are a variant, not a null
//! - **Closed modes**: The mode is an enum, so every match over it is exhaustive
//! - **Stable wire shape**: Field names and tuple arities are a compatibility surface
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A renderer
//! - A text-editing engine
//! - A keybinding dispatcher
//! - A transport (sockets, framing)
//!
//! ## Wire Shape
//!
//! ```text
//! EditorContext {
//!   buffers: map<string, EditorBufferContext | null>
//!   buffersToShow: array<string>
//!   focusBuffer: string
//!   editorMode: "Visual" | "Insert" | "Command" | "Normal"
//!   terminalSize: [columns, rows]
//!   commandsHist: array<string>        // oldest first
//! }
//! ```

pub mod buffer;
pub mod codec;
pub mod context;
pub mod error;
pub mod message;
pub mod mode;
pub mod validate;

pub use buffer::{BufferEntry, ColorRange, EditorBufferContext, EditorCursorContext, EditorWindow, Rgb};
pub use codec::{decode, decode_with, encode, encode_pretty, from_value, to_value};
pub use context::{EditorContext, TerminalSize};
pub use error::{ContextError, ContextResult};
pub use message::{
    decode_message, encode_message, BufferMessage, ContextMessage, InputMessage, ServerMessage,
};
pub use mode::EditorMode;
pub use validate::{repair, Inconsistency, Validated, ValidationPolicy};
