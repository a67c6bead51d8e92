//! Bounded conversation history.

use super::{ensure_parent, read_optional, MemoryError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Records kept after every write unless configured otherwise.
pub const DEFAULT_HISTORY_KEEP: usize = 5;

/// One line of the history log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Unix seconds
    pub ts: i64,
    /// What the user said, before rule rewriting
    pub user: String,
    /// Free-form outcome summary
    pub result: Value,
}

/// JSON-lines history file truncated to the newest `keep` records on every
/// write.
#[derive(Clone, Debug)]
pub struct HistoryLog {
    path: PathBuf,
    keep: usize,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>, keep: usize) -> Self {
        Self {
            path: path.into(),
            keep,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records oldest first. Lines that are not valid records are skipped.
    pub fn load(&self) -> Result<Vec<HistoryRecord>, MemoryError> {
        let text = read_optional(&self.path)?;
        let mut records = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(e) => debug!(error = %e, "skipping malformed history line"),
            }
        }
        Ok(records)
    }

    /// Append a record stamped with the current time and rewrite the file
    /// with only the newest `keep` records.
    pub fn push(&self, user: &str, result: Value) -> Result<(), MemoryError> {
        let mut records = self.load()?;
        records.push(HistoryRecord {
            ts: Utc::now().timestamp(),
            user: user.to_string(),
            result,
        });
        let skip = records.len().saturating_sub(self.keep);

        let mut out = String::new();
        for record in &records[skip..] {
            out.push_str(&serde_json::to_string(record)?);
            out.push('\n');
        }
        ensure_parent(&self.path)?;
        std::fs::write(&self.path, out).map_err(|e| MemoryError::io(&self.path, e))
    }

    /// Prompt rendering: `- user: …` / `  parsed: <json>` pairs, newest
    /// last, or `(no recent history)`.
    pub fn format_for_prompt(&self) -> String {
        let records = self.load().unwrap_or_default();
        let skip = records.len().saturating_sub(self.keep);
        let lines: Vec<String> = records[skip..]
            .iter()
            .map(|r| format!("- user: {}\n  parsed: {}", r.user.trim(), r.result))
            .collect();
        if lines.is_empty() {
            "(no recent history)".to_string()
        } else {
            lines.join("\n")
        }
    }
}
