//! Deterministic, LLM-free resolution.
//!
//! An utterance is first rewritten with the user's rules, then tried
//! against three tiers in order:
//!
//! 1. the exact-phrase table (after homophone normalization)
//! 2. legacy action lines, e.g. a rule that expands to `SET_TEMP 24`
//! 3. keyword and regex heuristics
//!
//! A miss is not an error; it means "ask the language model".

mod intent;
mod keywords;
mod normalize;
mod phrases;

pub use intent::{CommandIntent, Device, IntentAction};
pub use keywords::{contains_keyword, explicit_temperature, match_keywords};
pub use normalize::normalize;

use crate::action::{parse_canonical_line, Action, RawAction};
use crate::memory::{detect_teaching, HistoryLog, MemoryError, Rule, RuleMemory};
use serde::Serialize;
use serde_json::json;
use std::ops::RangeInclusive;
use tracing::{debug, info, warn};

/// Default range accepted for a number spoken next to an AC word.
pub const EXPLICIT_RANGE: RangeInclusive<i32> = 16..=30;

/// Which tier produced a hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    CanonicalLine,
    Keyword,
}

/// A successful fast-path resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct FastPathHit {
    pub tier: MatchTier,
    /// Empty for the canonical-line tier.
    pub intents: Vec<CommandIntent>,
    /// Unvalidated candidates for the validator.
    pub candidates: Vec<RawAction>,
}

/// Pure matching on already rewritten text.
///
/// `setpoint` is the current temperature set-point, used by relative and
/// "AC on" intents.
pub fn match_utterance(
    text: &str,
    setpoint: i32,
    explicit: &RangeInclusive<i32>,
) -> Option<FastPathHit> {
    if text.trim().is_empty() {
        return None;
    }

    let normalized = normalize(text);
    if let Some(intent) = phrases::lookup(&normalized) {
        return from_intents(MatchTier::Exact, vec![intent.clone()], setpoint);
    }

    if let Some(actions) = canonical_lines(text) {
        return Some(FastPathHit {
            tier: MatchTier::CanonicalLine,
            intents: Vec::new(),
            candidates: actions.iter().map(RawAction::from).collect(),
        });
    }

    let intents = match_keywords(&normalized, explicit)?;
    from_intents(MatchTier::Keyword, intents, setpoint)
}

fn from_intents(
    tier: MatchTier,
    intents: Vec<CommandIntent>,
    setpoint: i32,
) -> Option<FastPathHit> {
    let mut candidates = Vec::new();
    for intent in &intents {
        let Some(actions) = intent.candidates(setpoint) else {
            debug!(?intent, "intent has no direct action, deferring");
            return None;
        };
        candidates.extend(actions.iter().map(RawAction::from));
    }
    if candidates.is_empty() {
        return None;
    }
    Some(FastPathHit {
        tier,
        intents,
        candidates,
    })
}

/// Every non-blank, non-comment line parsed as an action line, or `None`.
fn canonical_lines(text: &str) -> Option<Vec<Action>> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();
    if lines.is_empty() {
        return None;
    }
    lines.into_iter().map(parse_canonical_line).collect()
}

/// Fast-path resolver bound to the rule and history stores.
#[derive(Clone, Debug)]
pub struct FastPathResolver {
    rules: RuleMemory,
    history: HistoryLog,
    explicit: RangeInclusive<i32>,
}

impl FastPathResolver {
    pub fn new(rules: RuleMemory, history: HistoryLog) -> Self {
        Self {
            rules,
            history,
            explicit: EXPLICIT_RANGE,
        }
    }

    pub fn with_explicit_range(mut self, range: RangeInclusive<i32>) -> Self {
        self.explicit = range;
        self
    }

    /// Resolve `utterance` without the language model.
    ///
    /// Hits are appended to the history log before returning.
    pub fn resolve(&self, utterance: &str, setpoint: i32) -> Option<FastPathHit> {
        let rewritten = self.rules.rewrite(utterance);
        let hit = match_utterance(&rewritten, setpoint, &self.explicit)?;
        debug!(tier = ?hit.tier, candidates = hit.candidates.len(), "fast path hit");

        let result = json!({"fastpath": true, "actions": hit.candidates});
        if let Err(e) = self.history.push(utterance, result) {
            warn!(error = %e, "failed to record fast path hit");
        }
        Some(hit)
    }

    /// Store the rule taught by `utterance`, if it is a teaching sentence.
    pub fn learn(&self, utterance: &str) -> Result<Option<Rule>, MemoryError> {
        let Some(rule) = detect_teaching(utterance) else {
            return Ok(None);
        };
        let added = self.rules.remember(&rule)?;
        info!(trigger = %rule.trigger, meaning = %rule.meaning, added, "learned rule");
        self.history.push(
            utterance,
            json!({"intent": "learn_rule", "saved_rule": rule}),
        )?;
        Ok(Some(rule))
    }
}
