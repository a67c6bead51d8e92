//! Collaborators the dispatch nodes run against.

use super::policy::EndPolicy;
use super::ActuatorError;
use crate::action::{Location, Switch};
use crate::config::PipelineConfig;
use crate::fastpath::FastPathResolver;
use crate::llm::{LlmProvider, LlmResolver, RetryPolicy};
use crate::memory::{ensure_parent, HistoryLog, RuleMemory};
use crate::validator::Validator;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Speech-to-text source. Returns an empty string when nothing was heard.
pub trait Transcriber: Send + Sync {
    fn listen(&self) -> String;
}

/// Device outputs. Each call may fail independently.
pub trait Actuators: Send + Sync {
    fn set_temperature_display(&self, celsius: i32) -> Result<(), ActuatorError>;
    fn set_fan(&self, state: Switch) -> Result<(), ActuatorError>;
    fn set_light(&self, location: Location, state: Switch) -> Result<(), ActuatorError>;
}

/// Where clarification and acknowledgement text goes.
pub trait ReplySink: Send + Sync {
    fn say(&self, text: &str) -> io::Result<()>;
}

/// Reply sink holding only the latest message in a file.
#[derive(Clone, Debug)]
pub struct ReplyFile {
    path: PathBuf,
}

impl ReplyFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReplySink for ReplyFile {
    fn say(&self, text: &str) -> io::Result<()> {
        ensure_parent(&self.path).map_err(io::Error::other)?;
        std::fs::write(&self.path, text)
    }
}

/// Replays recorded utterances, then hears silence.
#[derive(Debug, Default)]
pub struct ScriptedTranscriber {
    lines: Mutex<VecDeque<String>>,
}

impl ScriptedTranscriber {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: Mutex::new(lines.into_iter().map(Into::into).collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or_default()
    }
}

impl Transcriber for ScriptedTranscriber {
    fn listen(&self) -> String {
        let mut lines = match self.lines.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.pop_front().unwrap_or_default()
    }
}

/// Everything a node may touch outside the conversation record.
#[derive(Clone)]
pub struct DispatchEnv {
    pub transcriber: Arc<dyn Transcriber>,
    pub actuators: Arc<dyn Actuators>,
    pub replies: Arc<dyn ReplySink>,
    pub fastpath: FastPathResolver,
    pub llm: LlmResolver,
    pub validator: Validator,
    pub history: HistoryLog,
    pub policy: EndPolicy,
    /// Set-point assumed until the first temperature command
    pub default_setpoint: i32,
}

impl std::fmt::Debug for DispatchEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEnv")
            .field("fastpath", &self.fastpath)
            .field("llm", &self.llm)
            .field("validator", &self.validator)
            .field("history", &self.history)
            .field("policy", &self.policy)
            .field("default_setpoint", &self.default_setpoint)
            .finish_non_exhaustive()
    }
}

impl DispatchEnv {
    /// Wire the stores and resolvers described by `config`.
    pub fn from_config(
        config: &PipelineConfig,
        transcriber: Arc<dyn Transcriber>,
        actuators: Arc<dyn Actuators>,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        let memory = &config.memory;
        let rules = RuleMemory::new(memory.data_dir.join(&memory.rules_file));
        let history = HistoryLog::new(
            memory.data_dir.join(&memory.history_file),
            memory.history_keep,
        );
        let validator = Validator::new(config.temperature.safety());

        let fastpath = FastPathResolver::new(rules.clone(), history.clone())
            .with_explicit_range(config.fastpath.explicit_range());
        let llm = LlmResolver::new(provider, rules, history.clone())
            .with_validator(validator)
            .with_comfort(config.temperature.comfort())
            .with_budget(memory.prompt_char_budget)
            .with_retry(RetryPolicy {
                attempts: config.llm.retry_attempts,
                backoff: Duration::from_millis(config.llm.retry_backoff_ms),
            });

        Self {
            transcriber,
            actuators,
            replies: Arc::new(ReplyFile::new(memory.data_dir.join(&memory.reply_file))),
            fastpath,
            llm,
            validator,
            history,
            policy: config.conversation.policy(),
            default_setpoint: config.temperature.default_setpoint,
        }
    }

    pub fn with_replies(mut self, replies: Arc<dyn ReplySink>) -> Self {
        self.replies = replies;
        self
    }

    pub fn with_policy(mut self, policy: EndPolicy) -> Self {
        self.policy = policy;
        self
    }
}
