//! Authoritative editor state and snapshot production

use crate::buffer::EditorBuffer;
use context_types::{BufferEntry, EditorContext, EditorMode, TerminalSize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Editor state error types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Unknown buffer: {0}")]
    UnknownBuffer(String),

    #[error("Buffer already registered: {0}")]
    BufferExists(String),

    #[error("Buffer not shown: {0}")]
    BufferNotShown(String),

    #[error("Buffer listed more than once: {0}")]
    DuplicateShownBuffer(String),

    #[error("Not in command mode")]
    NotInCommandMode,
}

/// Editor state owned by the core
///
/// Every operation keeps the state consistent: the focused buffer is shown
/// whenever anything is shown, and every shown buffer is registered. As a
/// result every [`EditorState::snapshot`] passes strict validation.
///
/// Command history is kept oldest first. While in command mode the newest
/// entry is the line being typed.
#[derive(Debug, Clone)]
pub struct EditorState {
    /// `None` marks a buffer registered without resolved content
    buffers: BTreeMap<String, Option<EditorBuffer>>,
    buffers_to_show: Vec<String>,
    focus_buffer: String,
    editor_mode: EditorMode,
    terminal_size: TerminalSize,
    commands_hist: Vec<String>,
    history_limit: Option<usize>,
    revision: u64,
}

impl EditorState {
    /// Creates an empty editor with no terminal size observed yet
    pub fn new() -> Self {
        Self {
            buffers: BTreeMap::new(),
            buffers_to_show: Vec::new(),
            focus_buffer: String::new(),
            editor_mode: EditorMode::Normal,
            terminal_size: TerminalSize::ZERO,
            commands_hist: Vec::new(),
            history_limit: None,
            revision: 0,
        }
    }

    pub fn with_terminal_size(mut self, terminal_size: TerminalSize) -> Self {
        self.terminal_size = terminal_size;
        self
    }

    /// Caps the command history; the oldest entries are dropped first
    ///
    /// A limit of zero is treated as one so the line being typed survives.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit.max(1));
        self.trim_history();
        self
    }

    // Accessors

    pub fn editor_mode(&self) -> EditorMode {
        self.editor_mode
    }

    pub fn terminal_size(&self) -> TerminalSize {
        self.terminal_size
    }

    pub fn focus_buffer(&self) -> &str {
        &self.focus_buffer
    }

    pub fn buffers_to_show(&self) -> &[String] {
        &self.buffers_to_show
    }

    pub fn commands_hist(&self) -> &[String] {
        &self.commands_hist
    }

    /// Monotonic counter, bumped on every observable change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.buffers.contains_key(id)
    }

    /// Resolved buffer by id
    pub fn buffer(&self, id: &str) -> Option<&EditorBuffer> {
        self.buffers.get(id).and_then(Option::as_ref)
    }

    pub fn focused_buffer(&self) -> Option<&EditorBuffer> {
        self.buffer(&self.focus_buffer)
    }

    // Buffer lifecycle

    /// Registers a buffer id whose content is not resolved yet
    pub fn register_buffer(&mut self, id: impl Into<String>) -> Result<(), StateError> {
        let id = id.into();
        if self.buffers.contains_key(&id) {
            return Err(StateError::BufferExists(id));
        }
        debug!(buffer = %id, "registered unresolved buffer");
        self.buffers.insert(id, None);
        self.touch();
        Ok(())
    }

    /// Inserts a buffer, resolving or replacing any existing entry
    pub fn add_buffer(&mut self, id: impl Into<String>, buffer: EditorBuffer) {
        let id = id.into();
        debug!(buffer = %id, lines = buffer.line_count(), "added buffer");
        self.buffers.insert(id, Some(buffer));
        self.touch();
    }

    /// Removes a buffer and takes it out of the display order
    pub fn remove_buffer(&mut self, id: &str) -> Result<Option<EditorBuffer>, StateError> {
        let removed = self
            .buffers
            .remove(id)
            .ok_or_else(|| StateError::UnknownBuffer(id.to_string()))?;
        self.buffers_to_show.retain(|shown| shown != id);
        self.repair_focus();
        debug!(buffer = %id, "removed buffer");
        self.touch();
        Ok(removed)
    }

    /// Applies `f` to a resolved buffer
    pub fn update_buffer<R>(
        &mut self,
        id: &str,
        f: impl FnOnce(&mut EditorBuffer) -> R,
    ) -> Result<R, StateError> {
        let buffer = self
            .buffers
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or_else(|| StateError::UnknownBuffer(id.to_string()))?;
        let result = f(buffer);
        self.touch();
        Ok(result)
    }

    pub fn update_focused_buffer<R>(
        &mut self,
        f: impl FnOnce(&mut EditorBuffer) -> R,
    ) -> Result<R, StateError> {
        let focus = self.focus_buffer.clone();
        self.update_buffer(&focus, f)
    }

    // Display order and focus

    /// Appends a buffer to the display order (no-op if already shown)
    pub fn show_buffer(&mut self, id: &str) -> Result<(), StateError> {
        if !self.buffers.contains_key(id) {
            return Err(StateError::UnknownBuffer(id.to_string()));
        }
        if self.buffers_to_show.iter().any(|shown| shown == id) {
            return Ok(());
        }
        self.buffers_to_show.push(id.to_string());
        self.repair_focus();
        self.touch();
        Ok(())
    }

    pub fn hide_buffer(&mut self, id: &str) -> Result<(), StateError> {
        let pos = self
            .buffers_to_show
            .iter()
            .position(|shown| shown == id)
            .ok_or_else(|| StateError::BufferNotShown(id.to_string()))?;
        self.buffers_to_show.remove(pos);
        self.repair_focus();
        self.touch();
        Ok(())
    }

    /// Replaces the whole display order
    pub fn set_buffers_to_show(&mut self, ids: Vec<String>) -> Result<(), StateError> {
        for (i, id) in ids.iter().enumerate() {
            if !self.buffers.contains_key(id) {
                return Err(StateError::UnknownBuffer(id.clone()));
            }
            if ids[..i].contains(id) {
                return Err(StateError::DuplicateShownBuffer(id.clone()));
            }
        }
        self.buffers_to_show = ids;
        self.repair_focus();
        self.touch();
        Ok(())
    }

    /// Moves focus to a shown buffer
    pub fn focus(&mut self, id: &str) -> Result<(), StateError> {
        if !self.buffers_to_show.iter().any(|shown| shown == id) {
            return Err(StateError::BufferNotShown(id.to_string()));
        }
        if self.focus_buffer != id {
            debug!(from = %self.focus_buffer, to = %id, "focus changed");
            self.focus_buffer = id.to_string();
            self.touch();
        }
        Ok(())
    }

    // Mode and terminal

    /// Switches mode
    ///
    /// Entering command mode opens a fresh command line, as
    /// [`EditorState::begin_command`] does.
    pub fn set_mode(&mut self, mode: EditorMode) {
        if self.editor_mode == mode {
            return;
        }
        if mode == EditorMode::Command {
            debug!(from = %self.editor_mode, "mode changed, command line opened");
            self.begin_command();
        } else {
            debug!(from = %self.editor_mode, to = %mode, "mode changed");
            self.editor_mode = mode;
            self.touch();
        }
    }

    pub fn resize(&mut self, terminal_size: TerminalSize) {
        if self.terminal_size != terminal_size {
            debug!(size = %terminal_size, "terminal resized");
            self.terminal_size = terminal_size;
            self.touch();
        }
    }

    // Command line

    /// Enters command mode with a fresh, empty command line
    pub fn begin_command(&mut self) {
        self.editor_mode = EditorMode::Command;
        self.commands_hist.push(String::new());
        self.trim_history();
        self.touch();
    }

    pub fn push_command_char(&mut self, ch: char) -> Result<(), StateError> {
        self.ensure_command_mode()?;
        match self.commands_hist.last_mut() {
            Some(line) => line.push(ch),
            None => self.commands_hist.push(ch.to_string()),
        }
        self.touch();
        Ok(())
    }

    pub fn pop_command_char(&mut self) -> Result<Option<char>, StateError> {
        self.ensure_command_mode()?;
        let popped = self.commands_hist.last_mut().and_then(String::pop);
        if popped.is_some() {
            self.touch();
        }
        Ok(popped)
    }

    /// Clears the command line and returns to normal mode
    pub fn cancel_command(&mut self) -> Result<(), StateError> {
        self.ensure_command_mode()?;
        if let Some(line) = self.commands_hist.last_mut() {
            line.clear();
        }
        self.editor_mode = EditorMode::Normal;
        self.touch();
        Ok(())
    }

    /// Returns the typed command line and goes back to normal mode
    ///
    /// The line stays in the history; running it is up to the caller.
    pub fn finish_command(&mut self) -> Result<String, StateError> {
        self.ensure_command_mode()?;
        let line = self.commands_hist.last().cloned().unwrap_or_default();
        self.editor_mode = EditorMode::Normal;
        self.touch();
        Ok(line)
    }

    /// Appends a status or result line to the history
    pub fn push_history(&mut self, entry: impl Into<String>) {
        self.commands_hist.push(entry.into());
        self.trim_history();
        self.touch();
    }

    // Snapshots

    /// Produces a complete snapshot of the current state
    pub fn snapshot(&self) -> EditorContext {
        let buffers = self
            .buffers
            .iter()
            .map(|(id, buffer)| {
                let entry = match buffer {
                    Some(buffer) => BufferEntry::Present(buffer.to_buffer_context()),
                    None => BufferEntry::Unset,
                };
                (id.clone(), entry)
            })
            .collect();

        EditorContext::new(
            buffers,
            self.buffers_to_show.clone(),
            self.focus_buffer.clone(),
            self.editor_mode,
            self.terminal_size,
            self.commands_hist.clone(),
        )
    }

    // Private helpers

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn ensure_command_mode(&self) -> Result<(), StateError> {
        if self.editor_mode == EditorMode::Command {
            Ok(())
        } else {
            Err(StateError::NotInCommandMode)
        }
    }

    fn trim_history(&mut self) {
        if let Some(limit) = self.history_limit {
            if self.commands_hist.len() > limit {
                let excess = self.commands_hist.len() - limit;
                self.commands_hist.drain(..excess);
            }
        }
    }

    /// Keeps focus inside the display order
    ///
    /// Prefers the first shown buffer with resolved content; falls back to
    /// the first shown buffer, or no focus when nothing is shown.
    fn repair_focus(&mut self) {
        if self.buffers_to_show.iter().any(|id| *id == self.focus_buffer) {
            return;
        }
        let target = self
            .buffers_to_show
            .iter()
            .find(|id| matches!(self.buffers.get(*id), Some(Some(_))))
            .or_else(|| self.buffers_to_show.first())
            .cloned()
            .unwrap_or_default();
        if target != self.focus_buffer {
            debug!(from = %self.focus_buffer, to = %target, "focus moved");
            self.focus_buffer = target;
        }
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}
