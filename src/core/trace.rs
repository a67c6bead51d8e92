//! Status trace: the ordered record of status changes inside a session.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One status change, produced by running a single graph node.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State> {
    /// Status before the node ran
    pub from: S,
    /// Status the node left behind
    pub to: S,
    /// When the node finished
    pub timestamp: DateTime<Utc>,
    /// Conversation turn the node belongs to (1-based)
    pub turn: u32,
}

/// Ordered, immutable trace of status changes.
///
/// `record` returns a new trace instead of mutating, so a snapshot handed
/// out for diagnostics never changes under the reader.
///
/// # Example
///
/// ```rust
/// use hearth::core::{StateHistory, StateTransition};
/// use hearth::dispatch::TurnStatus;
/// use chrono::Utc;
///
/// let trace = StateHistory::new().record(StateTransition {
///     from: TurnStatus::Start,
///     to: TurnStatus::Analyzed,
///     timestamp: Utc::now(),
///     turn: 1,
/// });
///
/// assert_eq!(trace.get_path(), vec![&TurnStatus::Start, &TurnStatus::Analyzed]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: Vec<StateTransition<S>>,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new trace.
    pub fn record(&self, transition: StateTransition<S>) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// Statuses traversed: the first `from`, then every `to` in order.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Statuses reached during one turn, in order.
    pub fn turn_path(&self, turn: u32) -> Vec<&S> {
        self.transitions
            .iter()
            .filter(|t| t.turn == turn)
            .map(|t| &t.to)
            .collect()
    }

    /// Whether `status` was reached at any point.
    pub fn visited(&self, status: &S) -> bool {
        self.transitions.iter().any(|t| &t.to == status)
    }

    /// Wall time between the first and last recorded transition.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.transitions.first()?, self.transitions.last()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    /// All transitions in order.
    pub fn transitions(&self) -> &[StateTransition<S>] {
        &self.transitions
    }
}
