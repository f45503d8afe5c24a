//! Editor modes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Global interaction mode of the editor
///
/// Exactly one mode is active per snapshot. Serialized as the bare variant
/// name; any other tag fails to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EditorMode {
    /// Visual mode (selection)
    Visual,
    /// Insert mode (text entry)
    Insert,
    /// Command mode (command line prompt)
    Command,
    /// Normal mode (navigation and commands)
    #[default]
    Normal,
}

impl EditorMode {
    /// Every mode, in declaration order
    pub const ALL: [EditorMode; 4] = [
        EditorMode::Visual,
        EditorMode::Insert,
        EditorMode::Command,
        EditorMode::Normal,
    ];

    /// Status line label
    pub fn as_str(&self) -> &'static str {
        match self {
            EditorMode::Visual => "VISUAL",
            EditorMode::Insert => "INSERT",
            EditorMode::Command => "COMMAND",
            EditorMode::Normal => "NORMAL",
        }
    }

    /// Whether typed characters go into text (buffer or command line)
    pub fn accepts_text_input(&self) -> bool {
        matches!(self, EditorMode::Insert | EditorMode::Command)
    }
}

impl fmt::Display for EditorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorMode::Visual => write!(f, "Visual"),
            EditorMode::Insert => write!(f, "Insert"),
            EditorMode::Command => write!(f, "Command"),
            EditorMode::Normal => write!(f, "Normal"),
        }
    }
}
