//! Recognizes sentences that teach a new rule, e.g. `當我說 晚安 代表 關燈`.

use super::Rule;
use once_cell::sync::Lazy;
use regex::Regex;

static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^\s*當我說\s*(.+?)\s*(?:的時候|時候|時)?\s*[，,]?\s*代表\s*(.+?)\s*$",
        r"^\s*(?:以後|之後)\s*我說\s*(.+?)\s*(?:就|代表)\s*(.+?)\s*$",
        r"^\s*如果我說\s*(.+?)\s*[，,]?\s*(?:請|就)\s*(.+?)\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid teaching regex"))
    .collect()
});

const QUOTES: &[char] = &['「', '」', '"', '\''];

/// The rule taught by `utterance`, if it is a teaching sentence.
pub fn detect_teaching(utterance: &str) -> Option<Rule> {
    let text = utterance.trim();
    PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.captures(text)?;
        let trigger = caps[1].trim().trim_matches(QUOTES);
        let meaning = caps[2].trim().trim_matches(QUOTES);
        if trigger.is_empty() || meaning.is_empty() {
            return None;
        }
        Some(Rule::new(trigger, meaning))
    })
}
