//! User-taught rewrite rules.

use super::{ensure_parent, read_optional, MemoryError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

static RULE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^RULE:\s*When user says '(.+?)', it means '(.+?)'\.\s*$")
        .expect("valid rule line regex")
});

/// "When I say `trigger`, I mean `meaning`."
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub trigger: String,
    pub meaning: String,
}

impl Rule {
    pub fn new(trigger: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            meaning: meaning.into(),
        }
    }

    /// Line stored in the rule file.
    pub fn to_line(&self) -> String {
        format!(
            "RULE: When user says '{}', it means '{}'.",
            self.trigger, self.meaning
        )
    }

    /// Parse a stored line. Anything off-grammar is `None`.
    pub fn from_line(line: &str) -> Option<Self> {
        let caps = RULE_LINE.captures(line.trim())?;
        Some(Self::new(&caps[1], &caps[2]))
    }
}

/// Rewrite `text` with every rule, oldest first.
///
/// Plain substring replacement: each rule replaces all non-overlapping
/// occurrences of its trigger in the text produced by the rules before it.
/// Replacements are never re-scanned by the same rule.
pub fn apply_rules(text: &str, rules: &[Rule]) -> String {
    let mut out = text.to_string();
    for rule in rules {
        if !rule.trigger.is_empty() && out.contains(&rule.trigger) {
            out = out.replace(&rule.trigger, &rule.meaning);
        }
    }
    out
}

/// File-backed rule store.
#[derive(Clone, Debug)]
pub struct RuleMemory {
    path: PathBuf,
}

impl RuleMemory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file contents, trimmed. Used as prompt context.
    pub fn text(&self) -> Result<String, MemoryError> {
        Ok(read_optional(&self.path)?.trim().to_string())
    }

    /// Every well-formed rule, in insertion order.
    pub fn load(&self) -> Result<Vec<Rule>, MemoryError> {
        Ok(read_optional(&self.path)?
            .lines()
            .filter_map(Rule::from_line)
            .collect())
    }

    /// Rewrite `text` with the stored rules. An unreadable store leaves the
    /// text unchanged.
    pub fn rewrite(&self, text: &str) -> String {
        match self.load() {
            Ok(rules) => apply_rules(text, &rules),
            Err(e) => {
                warn!(error = %e, "rule memory unreadable, using text as-is");
                text.to_string()
            }
        }
    }

    /// Append `rule` unless an identical line is already stored.
    ///
    /// Returns whether the rule was new.
    pub fn remember(&self, rule: &Rule) -> Result<bool, MemoryError> {
        let line = rule.to_line();
        let existing = read_optional(&self.path)?;
        let lines: Vec<&str> = existing
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if lines.contains(&line.as_str()) {
            return Ok(false);
        }

        ensure_parent(&self.path)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| MemoryError::io(&self.path, e))?;
        let separator = if existing.is_empty() || existing.ends_with('\n') {
            ""
        } else {
            "\n"
        };
        writeln!(file, "{separator}{line}").map_err(|e| MemoryError::io(&self.path, e))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_round_trip() {
        let rule = Rule::new("熱一點", "SET_TEMP 24");
        let line = rule.to_line();
        assert_eq!(line, "RULE: When user says '熱一點', it means 'SET_TEMP 24'.");
        assert_eq!(Rule::from_line(&line), Some(rule));
    }

    #[test]
    fn off_grammar_lines_are_ignored() {
        assert_eq!(Rule::from_line("RULE: something else"), None);
        assert_eq!(Rule::from_line("When user says 'a', it means 'b'."), None);
        assert_eq!(Rule::from_line(""), None);
    }

    #[test]
    fn substring_replacement_not_regex() {
        let rules = vec![Rule::new("熱一點", "SET_TEMP 24")];
        assert_eq!(apply_rules("幫我熱一點", &rules), "幫我SET_TEMP 24");

        let rules = vec![Rule::new("a.c", "fan")];
        assert_eq!(apply_rules("abc", &rules), "abc");
        assert_eq!(apply_rules("a.c on", &rules), "fan on");
    }

    #[test]
    fn rules_apply_oldest_first() {
        let rules = vec![Rule::new("晚安", "關燈"), Rule::new("關燈", "LIGHT LIVING OFF")];
        assert_eq!(apply_rules("晚安", &rules), "LIGHT LIVING OFF");

        let reversed = vec![Rule::new("關燈", "LIGHT LIVING OFF"), Rule::new("晚安", "關燈")];
        assert_eq!(apply_rules("晚安", &reversed), "關燈");
    }

    #[test]
    fn remember_suppresses_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let memory = RuleMemory::new(dir.path().join("data/memory.txt"));

        let rule = Rule::new("晚安", "關燈");
        assert!(memory.remember(&rule).unwrap());
        assert!(!memory.remember(&rule).unwrap());
        assert!(memory.remember(&Rule::new("早安", "開燈")).unwrap());

        let loaded = memory.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], rule);
        assert_eq!(memory.rewrite("早安"), "開燈");
    }

    #[test]
    fn missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let memory = RuleMemory::new(dir.path().join("nope.txt"));
        assert!(memory.load().unwrap().is_empty());
        assert_eq!(memory.text().unwrap(), "");
        assert_eq!(memory.rewrite("開燈"), "開燈");
    }

    #[test]
    fn hand_written_lines_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.txt");
        std::fs::write(&path, "# notes\nRULE: When user says 'x', it means 'y'.").unwrap();

        let memory = RuleMemory::new(&path);
        assert!(memory.remember(&Rule::new("p", "q")).unwrap());

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "# notes\nRULE: When user says 'x', it means 'y'.\nRULE: When user says 'p', it means 'q'.\n"
        );
        assert_eq!(memory.load().unwrap().len(), 2);
    }
}
