//! Per-buffer context and its leaf types

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 24-bit color, serialized as `[r, g, b]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Highlight applied to a column range of one line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorRange {
    /// Start and end column (inclusive)
    pub range: (u16, u16),
    pub bg_color: Option<Rgb>,
    pub fg_color: Option<Rgb>,
}

impl ColorRange {
    pub fn new(range: (u16, u16)) -> Self {
        Self {
            range,
            bg_color: None,
            fg_color: None,
        }
    }

    pub fn with_bg(mut self, color: Rgb) -> Self {
        self.bg_color = Some(color);
        self
    }

    pub fn with_fg(mut self, color: Rgb) -> Self {
        self.fg_color = Some(color);
        self
    }
}

/// Cursor as seen across the boundary: position only, `(column, row)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorCursorContext {
    pub position: (u16, u16),
}

impl EditorCursorContext {
    pub fn new(column: u16, row: u16) -> Self {
        Self {
            position: (column, row),
        }
    }

    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    pub fn column(&self) -> u16 {
        self.position.0
    }

    pub fn row(&self) -> u16 {
        self.position.1
    }
}

/// Screen rectangle a buffer is drawn into, corners as `(column, row)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorWindow {
    pub start: (u16, u16),
    pub end: (u16, u16),
}

impl EditorWindow {
    pub fn new(start: (u16, u16), end: (u16, u16)) -> Self {
        Self { start, end }
    }

    pub fn width(&self) -> u16 {
        self.end.0.saturating_sub(self.start.0)
    }

    pub fn height(&self) -> u16 {
        self.end.1.saturating_sub(self.start.1)
    }

    /// Checks if a screen cell lies inside the window (corners included)
    pub fn contains(&self, column: u16, row: u16) -> bool {
        (self.start.0..=self.end.0).contains(&column) && (self.start.1..=self.end.1).contains(&row)
    }
}

/// Transferable state of one buffer
///
/// A plain value with no live handles, so it can be copied across the
/// core/presentation boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorBufferContext {
    pub cursors: Vec<EditorCursorContext>,
    pub content: Vec<String>,
    pub colors: Vec<Vec<ColorRange>>,
    pub memory: Vec<String>,
    pub buffer_window: EditorWindow,
    pub tab_width: u16,
}

impl EditorBufferContext {
    /// Creates an empty buffer context (one empty line, cursor at origin)
    pub fn new(buffer_window: EditorWindow, tab_width: u16) -> Self {
        Self::from_lines(vec![String::new()], buffer_window, tab_width)
    }

    pub fn from_lines(content: Vec<String>, buffer_window: EditorWindow, tab_width: u16) -> Self {
        Self {
            cursors: vec![EditorCursorContext::origin()],
            content,
            colors: Vec::new(),
            memory: Vec::new(),
            buffer_window,
            tab_width,
        }
    }

    pub fn line_count(&self) -> usize {
        self.content.len()
    }

    pub fn line(&self, row: usize) -> Option<&str> {
        self.content.get(row).map(|s| s.as_str())
    }

    pub fn primary_cursor(&self) -> Option<&EditorCursorContext> {
        self.cursors.first()
    }
}

/// Entry of the `buffers` map
///
/// A buffer id may be registered before its context is resolved; that
/// state is `Unset` (JSON `null`), distinct from the key being absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferEntry {
    Present(EditorBufferContext),
    Unset,
}

impl BufferEntry {
    pub fn is_present(&self) -> bool {
        matches!(self, BufferEntry::Present(_))
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, BufferEntry::Unset)
    }

    pub fn as_present(&self) -> Option<&EditorBufferContext> {
        match self {
            BufferEntry::Present(buffer) => Some(buffer),
            BufferEntry::Unset => None,
        }
    }

    pub fn into_present(self) -> Option<EditorBufferContext> {
        match self {
            BufferEntry::Present(buffer) => Some(buffer),
            BufferEntry::Unset => None,
        }
    }
}

impl From<EditorBufferContext> for BufferEntry {
    fn from(buffer: EditorBufferContext) -> Self {
        BufferEntry::Present(buffer)
    }
}

impl From<Option<EditorBufferContext>> for BufferEntry {
    fn from(buffer: Option<EditorBufferContext>) -> Self {
        match buffer {
            Some(buffer) => BufferEntry::Present(buffer),
            None => BufferEntry::Unset,
        }
    }
}

impl Serialize for BufferEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BufferEntry::Present(buffer) => serializer.serialize_some(buffer),
            BufferEntry::Unset => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for BufferEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<EditorBufferContext>::deserialize(deserializer).map(BufferEntry::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> EditorWindow {
        EditorWindow::new((9, 1), (80, 23))
    }

    #[test]
    fn test_rgb_serializes_as_triple() {
        let json = serde_json::to_string(&Rgb(42, 42, 55)).unwrap();
        assert_eq!(json, "[42,42,55]");
        assert_eq!(Rgb(42, 42, 55).to_string(), "#2a2a37");
    }

    #[test]
    fn test_color_range_wire_names() {
        let range = ColorRange::new((0, 7)).with_bg(Rgb(42, 42, 55));
        let value = serde_json::to_value(range).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "range": [0, 7], "bgColor": [42, 42, 55], "fgColor": null })
        );
    }

    #[test]
    fn test_window_dimensions() {
        let w = window();
        assert_eq!(w.width(), 71);
        assert_eq!(w.height(), 22);
        assert!(w.contains(9, 1));
        assert!(w.contains(80, 23));
        assert!(!w.contains(8, 1));
        assert!(!w.contains(10, 24));
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let w = EditorWindow::new((10, 10), (5, 5));
        assert_eq!(w.width(), 0);
        assert_eq!(w.height(), 0);
        assert!(!w.contains(7, 7));
    }

    #[test]
    fn test_new_buffer_context() {
        let buffer = EditorBufferContext::new(window(), 4);
        assert_eq!(buffer.line_count(), 1);
        assert_eq!(buffer.line(0), Some(""));
        assert_eq!(buffer.line(1), None);
        assert_eq!(buffer.primary_cursor(), Some(&EditorCursorContext::origin()));
    }

    #[test]
    fn test_buffer_context_wire_names() {
        let buffer = EditorBufferContext::from_lines(vec!["fn main() {}".into()], window(), 4);
        let value = serde_json::to_value(&buffer).unwrap();
        let object = value.as_object().unwrap();
        for key in ["cursors", "content", "colors", "memory", "bufferWindow", "tabWidth"] {
            assert!(object.contains_key(key), "missing {}", key);
        }
        assert_eq!(value["cursors"][0]["position"], serde_json::json!([0, 0]));
        assert_eq!(value["bufferWindow"]["end"], serde_json::json!([80, 23]));
    }

    #[test]
    fn test_buffer_entry_null_is_unset() {
        let entry: BufferEntry = serde_json::from_str("null").unwrap();
        assert!(entry.is_unset());
        assert_eq!(serde_json::to_string(&BufferEntry::Unset).unwrap(), "null");
    }

    #[test]
    fn test_buffer_entry_present() {
        let buffer = EditorBufferContext::new(window(), 2);
        let entry = BufferEntry::from(buffer.clone());
        let json = serde_json::to_string(&entry).unwrap();
        let back: BufferEntry = serde_json::from_str(&json).unwrap();

        assert!(back.is_present());
        assert_eq!(back.as_present(), Some(&buffer));
        assert_eq!(back.into_present(), Some(buffer));
    }

    #[test]
    fn test_buffer_entry_rejects_wrong_shape() {
        assert!(serde_json::from_str::<BufferEntry>("\"main\"").is_err());
        assert!(serde_json::from_str::<BufferEntry>("{\"content\": []}").is_err());
    }
}
