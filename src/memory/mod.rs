//! Durable conversation memory.
//!
//! Two plain-text stores live in the data directory:
//!
//! - the rule file, one `RULE: When user says '…', it means '…'.` line per
//!   user-taught rewrite, append-only and duplicate-free
//! - the history log, one JSON record per line, truncated to the most
//!   recent few records on every write
//!
//! Both stores are read fresh on every access, so edits made by hand
//! between turns are picked up without a restart.

mod history;
mod rules;
mod teach;

pub use history::{HistoryLog, HistoryRecord, DEFAULT_HISTORY_KEEP};
pub use rules::{apply_rules, Rule, RuleMemory};
pub use teach::detect_teaching;

use thiserror::Error;

/// Errors raised by the file-backed stores.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Reading or writing a store failed
    #[error("memory store I/O failed for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A history record could not be encoded
    #[error("failed to encode history record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl MemoryError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Read a whole text file; a missing file reads as empty.
pub(crate) fn read_optional(path: &std::path::Path) -> Result<String, MemoryError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(MemoryError::io(path, e)),
    }
}

/// Create the parent directory of `path` if needed.
pub(crate) fn ensure_parent(path: &std::path::Path) -> Result<(), MemoryError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|e| MemoryError::io(dir, e))
        }
        _ => Ok(()),
    }
}
