//! Live editor buffers

use context_types::{ColorRange, EditorBufferContext, EditorCursorContext, EditorWindow};

/// How a cursor is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CursorForm {
    SteadyBar,
    #[default]
    SteadyBlock,
    SteadyUnderline,
}

impl CursorForm {
    pub fn as_char(&self) -> char {
        match self {
            CursorForm::SteadyBar => '|',
            CursorForm::SteadyBlock => '█',
            CursorForm::SteadyUnderline => '_',
        }
    }
}

/// Cursor with its position as `(column, row)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorCursor {
    pub position: (u16, u16),
    pub form: CursorForm,
}

impl EditorCursor {
    pub fn new(column: u16, row: u16) -> Self {
        Self {
            position: (column, row),
            form: CursorForm::default(),
        }
    }

    pub fn to_cursor_context(&self) -> EditorCursorContext {
        EditorCursorContext {
            position: self.position,
        }
    }
}

impl Default for EditorCursor {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// Authoritative state of one buffer, owned by the editor core
///
/// Only part of it crosses the boundary; see [`EditorBuffer::to_buffer_context`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorBuffer {
    pub cursors: Vec<EditorCursor>,
    pub content: Vec<String>,
    pub colors: Vec<Vec<ColorRange>>,
    pub file_name: Option<String>,
    pub is_modified: bool,
    pub memory: Vec<String>,
    pub buffer_window: EditorWindow,
    /// Scroll offset as `(column, row)`
    pub pivot: (u16, u16),
    pub tab_width: u16,
}

impl EditorBuffer {
    pub fn new(buffer_window: EditorWindow, tab_width: u16) -> Self {
        Self {
            cursors: vec![EditorCursor::default()],
            content: vec![String::new()],
            colors: Vec::new(),
            file_name: None,
            is_modified: false,
            memory: vec![String::new()],
            buffer_window,
            pivot: (0, 0),
            tab_width,
        }
    }

    /// Builds a buffer from lines, expanding tabs to `tab_width` spaces
    pub fn from_lines<I, S>(lines: I, buffer_window: EditorWindow, tab_width: u16) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let indent = " ".repeat(tab_width as usize);
        let mut content: Vec<String> = lines
            .into_iter()
            .map(|line| line.as_ref().replace('\t', &indent))
            .collect();
        if content.is_empty() {
            content.push(String::new());
        }

        Self {
            content,
            ..Self::new(buffer_window, tab_width)
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn line_count(&self) -> usize {
        self.content.len()
    }

    pub fn primary_cursor(&self) -> Option<&EditorCursor> {
        self.cursors.first()
    }

    /// Scrolls so the primary cursor stays inside the window
    pub fn adapt_pivot_to_cursor(&mut self) {
        let Some(cursor) = self.cursors.first().copied() else {
            return;
        };
        let (column, row) = cursor.position;
        let height = self.buffer_window.height();
        let width = self.buffer_window.width();

        if row > self.pivot.1.saturating_add(height) {
            self.pivot.1 = row - height;
        } else if row < self.pivot.1 {
            self.pivot.1 = row;
        }

        if column > self.pivot.0.saturating_add(width) {
            self.pivot.0 = column - width;
        } else if column < self.pivot.0 {
            self.pivot.0 = column;
        }
    }

    /// Transferable view of this buffer
    ///
    /// Cursor forms, scroll offset, file name and the modified flag stay in
    /// the core.
    pub fn to_buffer_context(&self) -> EditorBufferContext {
        EditorBufferContext {
            cursors: self.cursors.iter().map(EditorCursor::to_cursor_context).collect(),
            content: self.content.clone(),
            colors: self.colors.clone(),
            memory: self.memory.clone(),
            buffer_window: self.buffer_window,
            tab_width: self.tab_width,
        }
    }
}
