//! The fail-closed resolver around a provider.

use super::prompt::{build_prompt, tail_chars, PromptContext};
use super::reply::{parse_reply, strip_code_fences};
use super::{LlmError, LlmProvider};
use crate::action::{Action, RawAction};
use crate::memory::{HistoryLog, RuleMemory};
use crate::validator::{TemperatureBounds, Validator, DEFAULT_SETPOINT};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Characters of memory and of history included in a prompt.
pub const PROMPT_CHAR_BUDGET: usize = 2000;

/// Bounded retry for transient provider errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first call
    pub attempts: u32,
    /// Base delay; attempt `n` waits `n * backoff` plus up to half a backoff
    /// of jitter
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            backoff: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 0,
            backoff: Duration::ZERO,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        let base = self.backoff.saturating_mul(attempt);
        let half_ms = (self.backoff.as_millis() / 2) as u64;
        if half_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..=half_ms))
    }
}

/// Outcome of one resolution, kept for the history log.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LlmResolution {
    /// Validated actions, possibly empty
    pub actions: Vec<Action>,
    /// Objects found in the reply before validation
    pub candidates: Vec<RawAction>,
    /// Reply with code fences removed, when the provider answered
    pub raw_reply: Option<String>,
    /// Provider error after retries, when it did not
    pub error: Option<String>,
}

/// Language-model resolver.
#[derive(Clone)]
pub struct LlmResolver {
    provider: Arc<dyn LlmProvider>,
    validator: Validator,
    rules: RuleMemory,
    history: HistoryLog,
    comfort: TemperatureBounds,
    budget: usize,
    retry: RetryPolicy,
}

impl std::fmt::Debug for LlmResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmResolver")
            .field("validator", &self.validator)
            .field("rules", &self.rules)
            .field("history", &self.history)
            .field("comfort", &self.comfort)
            .field("budget", &self.budget)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl LlmResolver {
    pub fn new(provider: Arc<dyn LlmProvider>, rules: RuleMemory, history: HistoryLog) -> Self {
        Self {
            provider,
            validator: Validator::default(),
            rules,
            history,
            comfort: TemperatureBounds::new(22.0, 26.0),
            budget: PROMPT_CHAR_BUDGET,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_comfort(mut self, comfort: TemperatureBounds) -> Self {
        self.comfort = comfort;
        self
    }

    pub fn with_budget(mut self, chars: usize) -> Self {
        self.budget = chars;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Prompt for `utterance` with the current memory and history.
    pub fn prompt_for(&self, utterance: &str, setpoint: Option<i32>) -> String {
        let memory = self.rules.text().unwrap_or_else(|e| {
            warn!(error = %e, "rule memory unreadable, prompting without it");
            String::new()
        });
        let history = self.history.format_for_prompt();
        let ctx = PromptContext {
            safety: self.validator.bounds(),
            comfort: self.comfort,
            setpoint: setpoint.unwrap_or(DEFAULT_SETPOINT),
            memory: tail_chars(&memory, self.budget).to_string(),
            history: tail_chars(&history, self.budget).to_string(),
        };
        build_prompt(&ctx, &self.rules.rewrite(utterance))
    }

    /// Ask the model. Never fails; errors become an empty action list.
    pub fn resolve(&self, utterance: &str, setpoint: Option<i32>) -> LlmResolution {
        if utterance.trim().is_empty() {
            return LlmResolution::default();
        }

        let prompt = self.prompt_for(utterance, setpoint);
        let reply = match self.call_with_retry(&prompt) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "language model unavailable, no actions");
                return LlmResolution {
                    error: Some(e.to_string()),
                    ..LlmResolution::default()
                };
            }
        };

        let candidates = parse_reply(&reply);
        let actions = self.validator.validate_actions(&candidates);
        debug!(
            candidates = candidates.len(),
            accepted = actions.len(),
            "language model reply parsed"
        );
        LlmResolution {
            actions,
            candidates,
            raw_reply: Some(strip_code_fences(&reply)),
            error: None,
        }
    }

    fn call_with_retry(&self, prompt: &str) -> Result<String, LlmError> {
        let mut attempt = 0;
        loop {
            match self.provider.generate(prompt) {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_transient() && attempt < self.retry.attempts => {
                    attempt += 1;
                    let delay = self.retry.delay(attempt);
                    warn!(error = %e, attempt, ?delay, "transient model error, retrying");
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Switch;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Scripted {
        replies: Vec<Result<String, LlmError>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies,
                calls: AtomicU32::new(0),
            })
        }
    }

    impl LlmProvider for Scripted {
        fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            self.replies
                .get(n)
                .or(self.replies.last())
                .cloned()
                .unwrap_or_else(|| Err(LlmError::Permanent("empty script".into())))
        }
    }

    fn resolver(
        provider: Arc<dyn LlmProvider>,
        dir: &tempfile::TempDir,
    ) -> LlmResolver {
        LlmResolver::new(
            provider,
            RuleMemory::new(dir.path().join("memory.txt")),
            HistoryLog::new(dir.path().join("history.jsonl"), 5),
        )
        .with_retry(RetryPolicy::none())
    }

    #[test]
    fn parses_and_validates_reply() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Scripted::new(vec![Ok(
            "```json\n[{\"type\":\"SET_TEMP\",\"value\":35},{\"type\":\"FAN\",\"state\":\"open\"},{\"type\":\"TV\"}]\n```"
                .to_string(),
        )]);
        let resolution = resolver(provider, &dir).resolve("熱死了", Some(27));

        assert_eq!(
            resolution.actions,
            vec![
                Action::SetTemperature { value: 30 },
                Action::Fan {
                    state: Switch::On,
                    duration: None
                },
            ]
        );
        assert_eq!(resolution.candidates.len(), 3);
        assert!(resolution.raw_reply.unwrap().starts_with('['));
        assert!(resolution.error.is_none());
    }

    #[test]
    fn blank_input_never_calls_provider() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Scripted::new(vec![Ok("[]".to_string())]);
        let resolution = resolver(provider.clone(), &dir).resolve("   ", None);
        assert_eq!(resolution, LlmResolution::default());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn non_array_reply_is_no_actions() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Scripted::new(vec![Ok("I turned on the fan for you.".to_string())]);
        let resolution = resolver(provider, &dir).resolve("fan please", None);
        assert!(resolution.actions.is_empty());
        assert_eq!(
            resolution.raw_reply.as_deref(),
            Some("I turned on the fan for you.")
        );
    }

    #[test]
    fn transient_errors_are_retried() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Scripted::new(vec![
            Err(LlmError::Transient("timeout".into())),
            Err(LlmError::Transient("503".into())),
            Ok(r#"[{"type":"LED","location":"GUEST","state":"off"}]"#.to_string()),
        ]);
        let resolver = resolver(provider.clone(), &dir).with_retry(RetryPolicy {
            attempts: 2,
            backoff: Duration::ZERO,
        });

        let resolution = resolver.resolve("客房暗一點", None);
        assert_eq!(resolution.actions.len(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn exhausted_retries_fail_closed() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Scripted::new(vec![Err(LlmError::Transient("timeout".into()))]);
        let resolver = resolver(provider.clone(), &dir).with_retry(RetryPolicy {
            attempts: 1,
            backoff: Duration::ZERO,
        });

        let resolution = resolver.resolve("開燈吧", None);
        assert!(resolution.actions.is_empty());
        assert!(resolution.error.unwrap().contains("timeout"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn permanent_errors_are_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Scripted::new(vec![Err(LlmError::Permanent("bad key".into()))]);
        let resolver = resolver(provider.clone(), &dir).with_retry(RetryPolicy::default());

        assert!(resolver.resolve("開燈吧", None).actions.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn prompt_uses_rewritten_text_and_default_setpoint() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(Arc::new(crate::llm::OfflineProvider), &dir);
        resolver
            .rules
            .remember(&crate::memory::Rule::new("好熱", "冷氣低一點"))
            .unwrap();

        let prompt = resolver.prompt_for("好熱喔", None);
        assert!(prompt.contains("USER COMMAND:\n冷氣低一點喔"));
        assert!(prompt.contains("Current temperature setting is 25 °C."));
        assert!(prompt.contains("RULE: When user says '好熱', it means '冷氣低一點'."));
    }

    #[test]
    fn jitter_stays_within_half_backoff() {
        let policy = RetryPolicy {
            attempts: 3,
            backoff: Duration::from_millis(100),
        };
        for attempt in 1..=3 {
            let delay = policy.delay(attempt);
            let base = Duration::from_millis(100 * attempt as u64);
            assert!(delay >= base && delay <= base + Duration::from_millis(50));
        }
    }
}
