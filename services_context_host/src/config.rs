//! Host configuration
//!
//! Configuration is stored as versioned JSON. Every field has a default, so
//! an empty object (`{}`) is a valid configuration.

use context_types::{TerminalSize, ValidationPolicy};
use editor_state::EditorState;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize config: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize config: {0}")]
    DeserializationFailed(String),

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

/// Context host configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostConfig {
    /// Version of the config format (for future migrations)
    pub version: u32,
    /// What to do with inconsistent snapshots
    pub policy: ValidationPolicy,
    /// Cap on command history length, unlimited when absent
    pub history_limit: Option<usize>,
    /// Terminal size assumed until the first resize
    pub initial_terminal_size: TerminalSize,
}

impl HostConfig {
    /// Current version of the config format
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            policy: ValidationPolicy::Strict,
            history_limit: None,
            initial_terminal_size: TerminalSize::ZERO,
        }
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    pub fn from_json_bytes(bytes: &[u8]) -> ConfigResult<Self> {
        let config: HostConfig = serde_json::from_slice(bytes)
            .map_err(|e| ConfigError::DeserializationFailed(e.to_string()))?;

        if config.version != Self::CURRENT_VERSION {
            return Err(ConfigError::UnsupportedVersion(config.version));
        }

        Ok(config)
    }

    pub fn to_json_bytes(&self) -> ConfigResult<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(|e| ConfigError::SerializationFailed(e.to_string()))
    }

    /// Loads configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let config = Self::from_json_bytes(&bytes)?;
        debug!(path = %path.display(), policy = %config.policy, "loaded host config");
        Ok(config)
    }

    /// Fresh editor state shaped by this configuration
    pub fn editor_state(&self) -> EditorState {
        let state = EditorState::new().with_terminal_size(self.initial_terminal_size);
        match self.history_limit {
            Some(limit) => state.with_history_limit(limit),
            None => state,
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::new()
    }
}
