//! The conversation state machine.
//!
//! A turn walks a small graph of nodes:
//!
//! ```text
//! intake → parse_actions → validate_actions ─┬─ execute_hardware ─┐
//!                                             └───────────────────┴→ update_history → check_end
//! check_end ─┬─ continue → clarify_or_continue → intake
//!            └─ needs_clarification | timeout_end | user_end | too_many_failures → end of pass
//! ```
//!
//! Nodes are effects over a [`DispatchEnv`]; the graph is an explicit table
//! of guarded edges. [`Session`] runs passes until a terminal status and
//! runs the clarification node between passes.

mod env;
mod graph;
mod machine;
mod nodes;
mod policy;
mod session;
mod state;
mod status;

pub use env::{Actuators, DispatchEnv, ReplyFile, ReplySink, ScriptedTranscriber, Transcriber};
pub use graph::{BuildError, DispatchGraph, Edge, GraphBuilder, Node, NodeAction, Target};
pub use machine::DispatchMachine;
pub use nodes::{reprompt_for, standard_graph, PARSE_FAILURE_MESSAGE};
pub use policy::{
    EndPolicy, EndReason, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_FAILURES, DEFAULT_STOP_KEYWORDS,
};
pub use session::{Session, SessionReport, TurnReport};
pub use state::{ConversationState, DeviceSnapshot, ParseSource};
pub use status::TurnStatus;

use thiserror::Error;

/// Errors that stop a session. Everything inside a turn is handled locally.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no action registered for node '{node}'")]
    MissingAction { node: Node },

    #[error("no edge leaves '{node}' with status '{status}'")]
    NoTransition { node: Node, status: TurnStatus },

    #[error("the current pass has already ended")]
    PassEnded,

    #[error("the conversation has already ended")]
    SessionEnded,

    #[error("invalid dispatch graph: {0}")]
    Graph(#[from] BuildError),

    /// A node body panicked or its blocking task was cancelled.
    #[error("node worker failed: {0}")]
    Worker(String),
}

/// A failed actuator call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{device} actuator failed: {message}")]
pub struct ActuatorError {
    pub device: String,
    pub message: String,
}

impl ActuatorError {
    pub fn new(device: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            message: message.into(),
        }
    }
}
