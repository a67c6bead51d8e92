//! Hearth: voice command understanding and dispatch for a small smart home.
//!
//! Hearth takes transcribed utterances ("開燈", "lower ac", "冷氣調25渡") and
//! turns them into validated device actions, then runs the conversation
//! around them: when to re-prompt, when to give up, when to hand off to the
//! hardware.
//!
//! # Pipeline
//!
//! - **Rules** ([`memory`]): user-taught rewrites are applied to every
//!   utterance before anything else.
//! - **Fast path** ([`fastpath`]): exact phrases after homophone correction,
//!   legacy action lines, then keyword heuristics. No network.
//! - **Language model** ([`llm`]): only when the fast path defers. Failures
//!   resolve to "no actions".
//! - **Validator** ([`validator`]): the only way to an [`action::Action`].
//! - **Dispatch** ([`dispatch`]): the turn graph, end-of-turn policy and the
//!   session loop.
//!
//! # Example
//!
//! ```rust
//! use hearth::fastpath::match_utterance;
//! use hearth::fastpath::EXPLICIT_RANGE;
//! use hearth::validator::Validator;
//! use hearth::action::Action;
//!
//! let hit = match_utterance("冷氣調 25 度", 25, &EXPLICIT_RANGE).unwrap();
//! let actions = Validator::default().validate_actions(&hit.candidates);
//! assert_eq!(actions, vec![Action::SetTemperature { value: 25 }]);
//! ```

pub mod action;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod fastpath;
pub mod llm;
pub mod memory;
pub mod validator;

pub use action::Action;
pub use config::PipelineConfig;
pub use dispatch::{DispatchEnv, Session, TurnStatus};
pub use validator::Validator;
