//! Language-model fallback resolver.
//!
//! Used only when the fast path defers. The model is asked for exactly one
//! JSON array of action objects; anything else, including transport
//! failure, resolves to "no actions".
//!
//! # Retry policy
//!
//! - [`LlmError::Transient`] (timeout, overload, connection reset) is retried
//!   up to [`RetryPolicy::attempts`] extra times with a jittered delay.
//! - [`LlmError::Permanent`] (bad key, unknown model) is not retried.
//!
//! Provider calls and retry backoff block the calling thread. The dispatch
//! graph runs them off the async workers.

mod prompt;
mod reply;
mod resolver;

pub use prompt::{build_prompt, tail_chars, PromptContext};
pub use reply::{parse_reply, strip_code_fences};
pub use resolver::{LlmResolution, LlmResolver, RetryPolicy};

use thiserror::Error;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Errors reported by a provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    /// Worth retrying: timeout, 5xx, connection refused
    #[error("transient provider error: {0}")]
    Transient(String),

    /// Not worth retrying: auth failure, 4xx, provider unavailable
    #[error("permanent provider error: {0}")]
    Permanent(String),
}

impl LlmError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// A text-in, text-out model endpoint.
///
/// Implementations own transport and authentication. Callers should apply
/// their own call-level timeout and report it as [`LlmError::Transient`].
pub trait LlmProvider: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Provider for running without network access: every call fails
/// permanently, so only the fast path resolves commands.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineProvider;

impl LlmProvider for OfflineProvider {
    fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::Permanent("no language model configured".to_string()))
    }
}

impl<F> LlmProvider for F
where
    F: Fn(&str) -> Result<String, LlmError> + Send + Sync,
{
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self(prompt)
    }
}
