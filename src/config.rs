//! Configuration for the command pipeline.
//!
//! Every section and field has a default, so a partial TOML file (or none)
//! is enough:
//!
//! ```toml
//! [temperature]
//! min = 18.0
//! max = 30.0
//!
//! [conversation]
//! idle_timeout_secs = 10
//! ```

use crate::dispatch::{EndPolicy, DEFAULT_STOP_KEYWORDS};
use crate::llm::DEFAULT_MODEL;
use crate::memory::DEFAULT_HISTORY_KEEP;
use crate::validator::{TemperatureBounds, DEFAULT_SETPOINT, MAX_TEMP, MIN_TEMP};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading or saving a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O failed for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("[temperature] {name} range {min}..={max} holds no whole degree")]
    Bounds { name: &'static str, min: f64, max: f64 },
}

impl ConfigError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub temperature: TemperatureConfig,
    pub fastpath: FastPathConfig,
    pub memory: MemoryConfig,
    pub llm: LlmConfig,
    pub conversation: ConversationConfig,
}

/// Temperature limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureConfig {
    /// Hard safety range enforced by the validator.
    pub min: f64,
    pub max: f64,
    /// Range the model is told to prefer.
    pub comfort_min: f64,
    pub comfort_max: f64,
    /// Set-point assumed before any temperature command.
    pub default_setpoint: i32,
}

impl Default for TemperatureConfig {
    fn default() -> Self {
        Self {
            min: MIN_TEMP,
            max: MAX_TEMP,
            comfort_min: 22.0,
            comfort_max: 26.0,
            default_setpoint: DEFAULT_SETPOINT,
        }
    }
}

impl TemperatureConfig {
    pub fn safety(&self) -> TemperatureBounds {
        TemperatureBounds::new(self.min, self.max)
    }

    pub fn comfort(&self) -> TemperatureBounds {
        TemperatureBounds::new(self.comfort_min, self.comfort_max)
    }

    /// Both ranges must be finite, ordered and span a whole degree.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, bounds) in [("safety", self.safety()), ("comfort", self.comfort())] {
            if bounds.whole_degrees().is_none() {
                return Err(ConfigError::Bounds {
                    name,
                    min: bounds.min,
                    max: bounds.max,
                });
            }
        }
        Ok(())
    }
}

/// Fast-path tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastPathConfig {
    /// Accepted range for a number spoken next to an AC word.
    pub explicit_min: i32,
    pub explicit_max: i32,
}

impl Default for FastPathConfig {
    fn default() -> Self {
        Self {
            explicit_min: 16,
            explicit_max: 30,
        }
    }
}

impl FastPathConfig {
    pub fn explicit_range(&self) -> RangeInclusive<i32> {
        self.explicit_min..=self.explicit_max
    }
}

/// File-backed stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Directory holding the files below.
    pub data_dir: PathBuf,
    pub rules_file: String,
    pub history_file: String,
    /// Latest clarification or acknowledgement.
    pub reply_file: String,
    /// Records kept in the history ring.
    pub history_keep: usize,
    /// Characters of rules and of history sent to the model.
    pub prompt_char_budget: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            rules_file: "memory.txt".to_string(),
            history_file: "history.jsonl".to_string(),
            reply_file: "reply.txt".to_string(),
            history_keep: DEFAULT_HISTORY_KEEP,
            prompt_char_budget: 2000,
        }
    }
}

/// Language-model settings. Transport belongs to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    /// Extra attempts after a transient failure.
    pub retry_attempts: u32,
    /// Base backoff, jittered by up to half.
    pub retry_backoff_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            retry_attempts: 2,
            retry_backoff_ms: 250,
        }
    }
}

/// End-of-conversation limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    pub idle_timeout_secs: u64,
    pub max_failures: u32,
    pub stop_keywords: Vec<String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 5,
            max_failures: 3,
            stop_keywords: DEFAULT_STOP_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl ConversationConfig {
    pub fn policy(&self) -> EndPolicy {
        EndPolicy {
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            max_failures: self.max_failures,
            stop_keywords: self.stop_keywords.clone(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a
    /// temperature range is unusable.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let config: Self = toml::from_str(&content)?;
        config.temperature.validate()?;
        Ok(config)
    }

    /// Save configuration as TOML, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot
    /// be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.temperature.safety(), TemperatureBounds::new(18.0, 30.0));
        assert_eq!(config.temperature.default_setpoint, 25);
        assert_eq!(config.fastpath.explicit_range(), 16..=30);
        assert_eq!(config.memory.history_keep, 5);
        assert_eq!(config.memory.prompt_char_budget, 2000);
        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert_eq!(config.conversation.policy(), EndPolicy::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [temperature]
            max = 28.0

            [conversation]
            idle_timeout_secs = 12
            stop_keywords = ["夠了"]
            "#,
        )
        .unwrap();

        assert_eq!(config.temperature.max, 28.0);
        assert_eq!(config.temperature.min, 18.0);
        assert_eq!(config.conversation.policy().idle_timeout, Duration::from_secs(12));
        assert_eq!(config.conversation.stop_keywords, vec!["夠了".to_string()]);
        assert_eq!(config.memory, MemoryConfig::default());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("hearth.toml");

        let mut config = PipelineConfig::default();
        config.llm.retry_attempts = 0;
        config.memory.data_dir = dir.path().join("data");
        config.save_to_file(&path).unwrap();

        assert_eq!(PipelineConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PipelineConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[temperature\nmin = ").unwrap();
        assert!(matches!(
            PipelineConfig::from_file(&path).unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn inverted_temperature_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inverted.toml");
        std::fs::write(&path, "[temperature]\nmin = 30.0\nmax = 18.0\n").unwrap();

        let err = PipelineConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Bounds { name: "safety", .. }));
    }

    #[test]
    fn range_without_whole_degree_is_rejected() {
        let config = TemperatureConfig {
            comfort_min: 22.2,
            comfort_max: 22.8,
            ..TemperatureConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Bounds { name: "comfort", .. })
        ));
        assert!(TemperatureConfig::default().validate().is_ok());
    }
}
