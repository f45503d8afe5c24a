//! Editor context snapshot

use crate::buffer::{BufferEntry, EditorBufferContext};
use crate::mode::EditorMode;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Last known terminal dimensions, serialized as `[columns, rows]`
///
/// Both components are unsigned; `0x0` is a valid degenerate size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TerminalSize(pub u16, pub u16);

impl TerminalSize {
    pub const ZERO: TerminalSize = TerminalSize(0, 0);

    pub const fn new(columns: u16, rows: u16) -> Self {
        Self(columns, rows)
    }

    pub fn columns(&self) -> u16 {
        self.0
    }

    pub fn rows(&self) -> u16 {
        self.1
    }

    /// No visible cells
    pub fn is_degenerate(&self) -> bool {
        self.0 == 0 || self.1 == 0
    }
}

impl From<(u16, u16)> for TerminalSize {
    fn from((columns, rows): (u16, u16)) -> Self {
        Self(columns, rows)
    }
}

impl fmt::Display for TerminalSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.0, self.1)
    }
}

/// Complete, immutable snapshot of editor state
///
/// Produced wholesale by the editor core. Consumers replace their previous
/// snapshot with each new one; there are no partial updates. Fields are
/// read-only once constructed.
///
/// `commands_hist` is ordered oldest first: the last element is the newest
/// entry (in command mode, the line being typed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorContext {
    #[serde(deserialize_with = "unique_buffers")]
    buffers: BTreeMap<String, BufferEntry>,
    buffers_to_show: Vec<String>,
    focus_buffer: String,
    editor_mode: EditorMode,
    terminal_size: TerminalSize,
    commands_hist: Vec<String>,
}

impl EditorContext {
    pub fn new(
        buffers: BTreeMap<String, BufferEntry>,
        buffers_to_show: Vec<String>,
        focus_buffer: impl Into<String>,
        editor_mode: EditorMode,
        terminal_size: TerminalSize,
        commands_hist: Vec<String>,
    ) -> Self {
        Self {
            buffers,
            buffers_to_show,
            focus_buffer: focus_buffer.into(),
            editor_mode,
            terminal_size,
            commands_hist,
        }
    }

    /// Snapshot of an editor with nothing observed yet
    pub fn empty() -> Self {
        Self::new(
            BTreeMap::new(),
            Vec::new(),
            String::new(),
            EditorMode::Normal,
            TerminalSize::ZERO,
            Vec::new(),
        )
    }

    pub fn buffers(&self) -> &BTreeMap<String, BufferEntry> {
        &self.buffers
    }

    pub fn buffers_to_show(&self) -> &[String] {
        &self.buffers_to_show
    }

    pub fn focus_buffer(&self) -> &str {
        &self.focus_buffer
    }

    pub fn editor_mode(&self) -> EditorMode {
        self.editor_mode
    }

    pub fn terminal_size(&self) -> TerminalSize {
        self.terminal_size
    }

    pub fn commands_hist(&self) -> &[String] {
        &self.commands_hist
    }

    /// Consumes the snapshot, returning its fields in constructor order
    #[allow(clippy::type_complexity)]
    pub fn into_parts(
        self,
    ) -> (
        BTreeMap<String, BufferEntry>,
        Vec<String>,
        String,
        EditorMode,
        TerminalSize,
        Vec<String>,
    ) {
        (
            self.buffers,
            self.buffers_to_show,
            self.focus_buffer,
            self.editor_mode,
            self.terminal_size,
            self.commands_hist,
        )
    }

    pub fn buffer(&self, id: &str) -> Option<&BufferEntry> {
        self.buffers.get(id)
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.buffers_to_show.iter().any(|shown| shown == id)
    }

    /// Resolved context of the focused buffer
    pub fn focused_buffer(&self) -> Option<&EditorBufferContext> {
        self.buffers
            .get(&self.focus_buffer)
            .and_then(BufferEntry::as_present)
    }

    /// Shown buffers in display order; ids without an entry are skipped
    pub fn visible_buffers(&self) -> impl Iterator<Item = (&str, &BufferEntry)> + '_ {
        self.buffers_to_show
            .iter()
            .filter_map(|id| self.buffers.get(id).map(|entry| (id.as_str(), entry)))
    }

    /// Newest history entry
    pub fn latest_command(&self) -> Option<&str> {
        self.commands_hist.last().map(|s| s.as_str())
    }

    /// Entry before the newest one
    pub fn previous_command(&self) -> Option<&str> {
        let len = self.commands_hist.len();
        if len < 2 {
            return None;
        }
        self.commands_hist.get(len - 2).map(|s| s.as_str())
    }

    /// Deterministic hash of the snapshot, for cheap change detection
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Sha256::new();

        hash_len(&mut hasher, self.buffers.len());
        for (id, entry) in &self.buffers {
            hash_str(&mut hasher, id);
            match entry {
                BufferEntry::Unset => hasher.update([0u8]),
                BufferEntry::Present(buffer) => {
                    hasher.update([1u8]);
                    hash_buffer(&mut hasher, buffer);
                }
            }
        }

        hash_len(&mut hasher, self.buffers_to_show.len());
        for id in &self.buffers_to_show {
            hash_str(&mut hasher, id);
        }

        hash_str(&mut hasher, &self.focus_buffer);
        hasher.update([self.editor_mode as u8]);
        hasher.update(self.terminal_size.0.to_le_bytes());
        hasher.update(self.terminal_size.1.to_le_bytes());

        hash_len(&mut hasher, self.commands_hist.len());
        for entry in &self.commands_hist {
            hash_str(&mut hasher, entry);
        }

        let result = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&result[..8]);
        u64::from_le_bytes(bytes)
    }

    pub(crate) fn parts_mut(
        &mut self,
    ) -> (
        &mut BTreeMap<String, BufferEntry>,
        &mut Vec<String>,
        &mut String,
    ) {
        (
            &mut self.buffers,
            &mut self.buffers_to_show,
            &mut self.focus_buffer,
        )
    }
}

/// Reads the buffer map, refusing a buffer id that appears twice
fn unique_buffers<'de, D>(deserializer: D) -> Result<BTreeMap<String, BufferEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UniqueBuffers;

    impl<'de> Visitor<'de> for UniqueBuffers {
        type Value = BTreeMap<String, BufferEntry>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of buffer ids to buffer contexts or null")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut buffers = BTreeMap::new();
            while let Some((id, entry)) = access.next_entry::<String, BufferEntry>()? {
                if buffers.contains_key(&id) {
                    return Err(de::Error::custom(format_args!("duplicate buffer id {:?}", id)));
                }
                buffers.insert(id, entry);
            }
            Ok(buffers)
        }
    }

    deserializer.deserialize_map(UniqueBuffers)
}

impl Default for EditorContext {
    fn default() -> Self {
        Self::empty()
    }
}

fn hash_len(hasher: &mut Sha256, len: usize) {
    hasher.update((len as u64).to_le_bytes());
}

fn hash_str(hasher: &mut Sha256, s: &str) {
    hash_len(hasher, s.len());
    hasher.update(s.as_bytes());
}

fn hash_buffer(hasher: &mut Sha256, buffer: &EditorBufferContext) {
    hash_len(hasher, buffer.cursors.len());
    for cursor in &buffer.cursors {
        hasher.update(cursor.position.0.to_le_bytes());
        hasher.update(cursor.position.1.to_le_bytes());
    }

    hash_len(hasher, buffer.content.len());
    for line in &buffer.content {
        hash_str(hasher, line);
    }

    hash_len(hasher, buffer.colors.len());
    for line in &buffer.colors {
        hash_len(hasher, line.len());
        for range in line {
            hasher.update(range.range.0.to_le_bytes());
            hasher.update(range.range.1.to_le_bytes());
            for color in [range.bg_color, range.fg_color] {
                match color {
                    Some(rgb) => hasher.update([1, rgb.0, rgb.1, rgb.2]),
                    None => hasher.update([0u8]),
                }
            }
        }
    }

    hash_len(hasher, buffer.memory.len());
    for entry in &buffer.memory {
        hash_str(hasher, entry);
    }

    let window = buffer.buffer_window;
    for coord in [window.start.0, window.start.1, window.end.0, window.end.1] {
        hasher.update(coord.to_le_bytes());
    }
    hasher.update(buffer.tab_width.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::EditorWindow;

    fn buffer(lines: &[&str]) -> EditorBufferContext {
        EditorBufferContext::from_lines(
            lines.iter().map(|l| l.to_string()).collect(),
            EditorWindow::new((1, 1), (80, 23)),
            4,
        )
    }

    fn sample() -> EditorContext {
        let mut buffers = BTreeMap::new();
        buffers.insert("main".to_string(), BufferEntry::from(buffer(&["hello"])));
        buffers.insert("numerate_lines".to_string(), BufferEntry::Unset);
        EditorContext::new(
            buffers,
            vec!["numerate_lines".into(), "main".into()],
            "main",
            EditorMode::Insert,
            TerminalSize::new(80, 24),
            vec!["w".into(), "File saved: a.txt".into(), String::new()],
        )
    }

    #[test]
    fn test_terminal_size_serializes_as_pair() {
        assert_eq!(
            serde_json::to_string(&TerminalSize::new(80, 24)).unwrap(),
            "[80,24]"
        );
        let size: TerminalSize = serde_json::from_str("[0,0]").unwrap();
        assert_eq!(size, TerminalSize::ZERO);
        assert!(size.is_degenerate());
        assert_eq!(size.to_string(), "0x0");
    }

    #[test]
    fn test_terminal_size_rejects_bad_shapes() {
        assert!(serde_json::from_str::<TerminalSize>("[80]").is_err());
        assert!(serde_json::from_str::<TerminalSize>("[80,24,1]").is_err());
        assert!(serde_json::from_str::<TerminalSize>("[-1,24]").is_err());
        assert!(serde_json::from_str::<TerminalSize>("[70000,24]").is_err());
    }

    #[test]
    fn test_accessors() {
        let ctx = sample();
        assert_eq!(ctx.focus_buffer(), "main");
        assert_eq!(ctx.editor_mode(), EditorMode::Insert);
        assert_eq!(ctx.terminal_size().columns(), 80);
        assert_eq!(ctx.terminal_size().rows(), 24);
        assert_eq!(ctx.buffers().len(), 2);
        assert_eq!(ctx.buffers_to_show().len(), 2);
        assert_eq!(ctx.commands_hist().len(), 3);
    }

    #[test]
    fn test_derived_queries() {
        let ctx = sample();
        assert!(ctx.is_visible("main"));
        assert!(!ctx.is_visible("explorer"));
        assert_eq!(ctx.focused_buffer().and_then(|b| b.line(0)), Some("hello"));
        assert!(ctx.buffer("numerate_lines").unwrap().is_unset());

        let order: Vec<&str> = ctx.visible_buffers().map(|(id, _)| id).collect();
        assert_eq!(order, vec!["numerate_lines", "main"]);
    }

    #[test]
    fn test_history_queries() {
        let ctx = sample();
        assert_eq!(ctx.latest_command(), Some(""));
        assert_eq!(ctx.previous_command(), Some("File saved: a.txt"));

        let empty = EditorContext::empty();
        assert_eq!(empty.latest_command(), None);
        assert_eq!(empty.previous_command(), None);
    }

    #[test]
    fn test_focused_buffer_unset_is_none() {
        let mut buffers = BTreeMap::new();
        buffers.insert("main".to_string(), BufferEntry::Unset);
        let ctx = EditorContext::new(
            buffers,
            vec!["main".into()],
            "main",
            EditorMode::Normal,
            TerminalSize::ZERO,
            Vec::new(),
        );
        assert!(ctx.focused_buffer().is_none());
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(sample(), sample());

        let (buffers, shown, focus, mode, size, mut hist) = sample().into_parts();
        hist.swap(0, 1);
        let reordered = EditorContext::new(buffers, shown, focus, mode, size, hist);
        assert_ne!(sample(), reordered);
    }

    #[test]
    fn test_unset_differs_from_absent() {
        let (mut buffers, shown, focus, mode, size, hist) = sample().into_parts();
        buffers.remove("numerate_lines");
        let without_key = EditorContext::new(buffers, shown, focus, mode, size, hist);
        assert_ne!(sample(), without_key);
    }

    #[test]
    fn test_fingerprint_deterministic() {
        assert_eq!(sample().fingerprint(), sample().fingerprint());
    }

    #[test]
    fn test_fingerprint_tracks_changes() {
        let (buffers, shown, focus, _, size, hist) = sample().into_parts();
        let other = EditorContext::new(buffers, shown, focus, EditorMode::Normal, size, hist);
        assert_ne!(sample().fingerprint(), other.fingerprint());
        assert_ne!(sample().fingerprint(), EditorContext::empty().fingerprint());
    }
}
