//! End-of-turn policy.
//!
//! Every reason to stop is collected with `Validation`, so diagnostics see
//! all of them at once. Routing only needs the first, and the order is
//! fixed: idle timeout, failure ceiling, stop keyword.

use super::state::ConversationState;
use super::status::TurnStatus;
use crate::fastpath::contains_keyword;
use chrono::{DateTime, Utc};
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// Idle time after which the conversation ends.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Consecutive clarifications tolerated before giving up.
pub const DEFAULT_MAX_FAILURES: u32 = 3;

/// Words that end the conversation when spoken.
pub const DEFAULT_STOP_KEYWORDS: [&str; 6] = ["結束", "停止", "再見", "end", "stop", "bye"];

/// Why a conversation should stop.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EndReason {
    #[error("no input for {elapsed:?} (limit {limit:?})")]
    IdleTimeout { limit: Duration, elapsed: Duration },

    #[error("{failures} consecutive failures (limit {limit})")]
    TooManyFailures { limit: u32, failures: u32 },

    #[error("stop keyword '{keyword}' spoken")]
    StopKeyword { keyword: String },
}

impl EndReason {
    pub fn status(&self) -> TurnStatus {
        match self {
            Self::IdleTimeout { .. } => TurnStatus::TimeoutEnd,
            Self::TooManyFailures { .. } => TurnStatus::TooManyFailures,
            Self::StopKeyword { .. } => TurnStatus::UserEnd,
        }
    }
}

/// Limits applied by the `check_end` node.
#[derive(Clone, Debug, PartialEq)]
pub struct EndPolicy {
    pub idle_timeout: Duration,
    pub max_failures: u32,
    pub stop_keywords: Vec<String>,
}

impl Default for EndPolicy {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_failures: DEFAULT_MAX_FAILURES,
            stop_keywords: DEFAULT_STOP_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl EndPolicy {
    /// Collect every reason the conversation should end at `now`.
    ///
    /// The idle clock only runs once something has been heard.
    pub fn check(
        &self,
        state: &ConversationState,
        now: DateTime<Utc>,
    ) -> Validation<(), NonEmptyVec<EndReason>> {
        let mut checks: Vec<Validation<(), NonEmptyVec<EndReason>>> = Vec::new();

        if let Some(last) = state.last_input_time {
            let elapsed = now
                .signed_duration_since(last)
                .to_std()
                .unwrap_or(Duration::ZERO);
            checks.push(if elapsed > self.idle_timeout {
                Validation::fail(EndReason::IdleTimeout {
                    limit: self.idle_timeout,
                    elapsed,
                })
            } else {
                Validation::success(())
            });
        }

        checks.push(if state.failure_count >= self.max_failures {
            Validation::fail(EndReason::TooManyFailures {
                limit: self.max_failures,
                failures: state.failure_count,
            })
        } else {
            Validation::success(())
        });

        checks.push(match self.stop_keyword(&state.input_text) {
            Some(keyword) => Validation::fail(EndReason::StopKeyword { keyword }),
            None => Validation::success(()),
        });

        Validation::all_vec(checks).map(|_| ())
    }

    /// Status the `check_end` node leaves behind.
    pub fn evaluate(&self, state: &ConversationState, now: DateTime<Utc>) -> TurnStatus {
        match self.check(state, now) {
            Validation::Failure(reasons) => reasons
                .iter()
                .next()
                .map(EndReason::status)
                .unwrap_or(TurnStatus::UserEnd),
            Validation::Success(()) if state.needs_clarification => {
                TurnStatus::NeedsClarification
            }
            Validation::Success(()) => TurnStatus::Continue,
        }
    }

    fn stop_keyword(&self, text: &str) -> Option<String> {
        let lowered = text.to_lowercase();
        self.stop_keywords
            .iter()
            .find(|k| !k.is_empty() && contains_keyword(&lowered, &k.to_lowercase()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heard(text: &str, seconds_ago: i64) -> ConversationState {
        ConversationState {
            input_text: text.to_string(),
            last_input_time: Some(Utc::now() - chrono::Duration::seconds(seconds_ago)),
            ..ConversationState::default()
        }
    }

    #[test]
    fn accumulates_every_reason() {
        let mut state = heard("好了 bye", 30);
        state.failure_count = 4;

        match EndPolicy::default().check(&state, Utc::now()) {
            Validation::Failure(reasons) => {
                assert_eq!(reasons.len(), 3);
                assert!(reasons
                    .iter()
                    .any(|r| matches!(r, EndReason::IdleTimeout { .. })));
                assert!(reasons
                    .iter()
                    .any(|r| matches!(r, EndReason::StopKeyword { keyword } if keyword == "bye")));
            }
            Validation::Success(_) => panic!("expected reasons to end"),
        }
    }

    #[test]
    fn timeout_wins_over_other_reasons() {
        let mut state = heard("再見", 30);
        state.failure_count = 3;
        assert_eq!(
            EndPolicy::default().evaluate(&state, Utc::now()),
            TurnStatus::TimeoutEnd
        );
    }

    #[test]
    fn failures_before_stop_keyword() {
        let mut state = heard("停止", 0);
        state.failure_count = 3;
        assert_eq!(
            EndPolicy::default().evaluate(&state, Utc::now()),
            TurnStatus::TooManyFailures
        );
    }

    #[test]
    fn stop_keyword_ends_conversation() {
        let policy = EndPolicy::default();
        assert_eq!(policy.evaluate(&heard("好，再見", 0), Utc::now()), TurnStatus::UserEnd);
        assert_eq!(policy.evaluate(&heard("STOP please", 0), Utc::now()), TurnStatus::UserEnd);
    }

    #[test]
    fn stop_words_need_word_boundaries() {
        let policy = EndPolicy::default();
        assert_eq!(
            policy.evaluate(&heard("turn the fan on at the weekend", 0), Utc::now()),
            TurnStatus::Continue
        );
    }

    #[test]
    fn pending_clarification_is_reported() {
        let mut state = heard("嗯", 0);
        state.needs_clarification = true;
        assert_eq!(
            EndPolicy::default().evaluate(&state, Utc::now()),
            TurnStatus::NeedsClarification
        );
    }

    #[test]
    fn idle_clock_waits_for_first_input() {
        let state = ConversationState::default();
        assert!(EndPolicy::default()
            .check(&state, Utc::now() + chrono::Duration::hours(1))
            .is_success());
    }
}
