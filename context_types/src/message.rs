//! Tagged messages exchanged with presentation clients
//!
//! Only the serialized shape is defined here. How the bytes travel is up to
//! the host.

use crate::buffer::EditorBufferContext;
use crate::context::EditorContext;
use crate::error::ContextResult;
use crate::mode::EditorMode;
use crate::validate::{Inconsistency, ValidationPolicy};
use serde::{Deserialize, Serialize};

/// Full editor snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMessage {
    pub editor: EditorContext,
}

/// Raw input forwarded to a client, with the mode it arrived in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputMessage {
    pub input: String,
    pub editor_mode: EditorMode,
}

/// One buffer, answering a client request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferMessage {
    pub request_id: String,
    pub buffer_name: String,
    pub buffer: EditorBufferContext,
}

/// Message envelope: `{ "message_type": ..., "info": ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "message_type", content = "info", rename_all = "camelCase")]
pub enum ServerMessage {
    Context(ContextMessage),
    Input(InputMessage),
    Buffer(BufferMessage),
}

impl ServerMessage {
    pub fn context(editor: EditorContext) -> Self {
        ServerMessage::Context(ContextMessage { editor })
    }

    pub fn input(input: impl Into<String>, editor_mode: EditorMode) -> Self {
        ServerMessage::Input(InputMessage {
            input: input.into(),
            editor_mode,
        })
    }

    pub fn buffer(
        request_id: impl Into<String>,
        buffer_name: impl Into<String>,
        buffer: EditorBufferContext,
    ) -> Self {
        ServerMessage::Buffer(BufferMessage {
            request_id: request_id.into(),
            buffer_name: buffer_name.into(),
            buffer,
        })
    }

    /// Wire tag of this message
    pub fn message_type(&self) -> &'static str {
        match self {
            ServerMessage::Context(_) => "context",
            ServerMessage::Input(_) => "input",
            ServerMessage::Buffer(_) => "buffer",
        }
    }
}

pub fn encode_message(message: &ServerMessage) -> ContextResult<Vec<u8>> {
    Ok(serde_json::to_vec(message)?)
}

/// Decodes an envelope; an embedded snapshot goes through `policy`
///
/// Returns the message together with any repairs made to its snapshot.
pub fn decode_message(
    bytes: &[u8],
    policy: ValidationPolicy,
) -> ContextResult<(ServerMessage, Vec<Inconsistency>)> {
    let message: ServerMessage = serde_json::from_slice(bytes)?;
    match message {
        ServerMessage::Context(ContextMessage { editor }) => {
            let validated = policy.enforce(editor)?;
            Ok((ServerMessage::context(validated.context), validated.repairs))
        }
        other => Ok((other, Vec::new())),
    }
}
