//! # Context CLI
//!
//! Operations behind `contextctl`: checking, normalizing and summarizing
//! snapshot files.

use anyhow::{Context, Result};
use context_types::{
    decode, decode_with, encode, encode_pretty, BufferEntry, ContextError, ContextResult,
    EditorContext, Inconsistency, ValidationPolicy,
};
use services_context_host::HostConfig;
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Reads a snapshot file, or stdin when the path is `-`
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    if path.as_os_str() == "-" {
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("failed to read stdin")?;
    } else {
        bytes = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
    }
    debug!(path = %path.display(), bytes = bytes.len(), "read input");
    Ok(bytes)
}

/// Picks the validation policy: flags override the config file
pub fn resolve_policy(
    config_path: Option<&Path>,
    strict: bool,
    lenient: bool,
) -> Result<ValidationPolicy> {
    if strict {
        return Ok(ValidationPolicy::Strict);
    }
    if lenient {
        return Ok(ValidationPolicy::Lenient);
    }
    match config_path {
        Some(path) => {
            let config = HostConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            Ok(config.policy)
        }
        None => Ok(ValidationPolicy::default()),
    }
}

/// Result of checking one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Valid,
    Repaired(Vec<Inconsistency>),
    Inconsistent(Vec<Inconsistency>),
    Malformed(String),
}

impl CheckOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, CheckOutcome::Valid | CheckOutcome::Repaired(_))
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckOutcome::Valid => write!(f, "ok"),
            CheckOutcome::Repaired(repairs) => {
                write!(f, "ok ({} repaired)", repairs.len())?;
                for repair in repairs {
                    write!(f, "\n  repaired: {}", repair)?;
                }
                Ok(())
            }
            CheckOutcome::Inconsistent(issues) => {
                write!(f, "inconsistent")?;
                for issue in issues {
                    write!(f, "\n  {}", issue)?;
                }
                Ok(())
            }
            CheckOutcome::Malformed(reason) => write!(f, "malformed: {}", reason),
        }
    }
}

pub fn check(bytes: &[u8], policy: ValidationPolicy) -> CheckOutcome {
    match decode_with(bytes, policy) {
        Ok(validated) if validated.was_repaired() => CheckOutcome::Repaired(validated.repairs),
        Ok(_) => CheckOutcome::Valid,
        Err(ContextError::InconsistentContext(issues)) => CheckOutcome::Inconsistent(issues),
        Err(ContextError::MalformedContext { reason }) => CheckOutcome::Malformed(reason),
    }
}

/// Decodes, applies the policy and re-encodes
pub fn normalize(bytes: &[u8], policy: ValidationPolicy, pretty: bool) -> ContextResult<Vec<u8>> {
    let context = decode_with(bytes, policy)?.into_context();
    if pretty {
        encode_pretty(&context)
    } else {
        encode(&context)
    }
}

/// Human-readable overview of a snapshot
pub struct Summary<'a>(pub &'a EditorContext);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let context = self.0;
        writeln!(f, "mode: {}", context.editor_mode().as_str())?;
        writeln!(f, "terminal: {}", context.terminal_size())?;

        writeln!(f, "buffers:")?;
        for id in context.buffers_to_show() {
            let marker = if id == context.focus_buffer() { '*' } else { ' ' };
            match context.buffer(id) {
                Some(BufferEntry::Present(buffer)) => {
                    writeln!(f, "{} {} ({} lines)", marker, id, buffer.line_count())?
                }
                Some(BufferEntry::Unset) => writeln!(f, "{} {} (unset)", marker, id)?,
                None => writeln!(f, "{} {} (missing)", marker, id)?,
            }
        }
        let hidden = context
            .buffers()
            .keys()
            .filter(|id| !context.is_visible(id))
            .count();
        if hidden > 0 {
            writeln!(f, "  + {} hidden", hidden)?;
        }

        writeln!(f, "latest command: {}", context.latest_command().unwrap_or("-"))
    }
}

pub fn summary(context: &EditorContext) -> String {
    Summary(context).to_string()
}

/// Decodes structurally, then summarizes
pub fn summarize_bytes(bytes: &[u8]) -> ContextResult<String> {
    decode(bytes).map(|context| summary(&context))
}
