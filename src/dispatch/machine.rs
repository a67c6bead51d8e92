//! Executes a dispatch graph one node at a time.

use super::graph::{DispatchGraph, Node, Target};
use super::state::ConversationState;
use super::status::TurnStatus;
use super::DispatchError;
use crate::core::{StateHistory, StateTransition};
use chrono::Utc;
use std::sync::Arc;
use stillwater::effect::{BoxedEffect, Effect};
use stillwater::prelude::*;

/// Walks a [`DispatchGraph`], owning the conversation record.
///
/// `step()` returns the effect for the current node without touching the
/// machine; after running it, hand the new record to `apply_result()`.
pub struct DispatchMachine<Env> {
    graph: Arc<DispatchGraph<Env>>,
    cursor: Option<Node>,
    state: ConversationState,
    trace: StateHistory<TurnStatus>,
}

impl<Env: Clone + Send + Sync + 'static> DispatchMachine<Env> {
    /// Machine positioned at the graph's entry node.
    pub fn new(graph: Arc<DispatchGraph<Env>>, state: ConversationState) -> Self {
        let cursor = Some(graph.entry());
        Self {
            graph,
            cursor,
            state,
            trace: StateHistory::new(),
        }
    }

    /// Node that runs on the next step, or `None` once the pass has ended.
    pub fn current_node(&self) -> Option<Node> {
        self.cursor
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn into_state(self) -> ConversationState {
        self.state
    }

    pub fn trace(&self) -> &StateHistory<TurnStatus> {
        &self.trace
    }

    /// Whether the current pass left the graph.
    pub fn is_done(&self) -> bool {
        self.cursor.is_none()
    }

    /// Whether the conversation reached a terminal status.
    pub fn is_final(&self) -> bool {
        use crate::core::State;
        self.state.status.is_final()
    }

    /// Continue from `node` after a pass ended.
    pub fn resume_at(&mut self, node: Node) {
        self.cursor = Some(node);
    }

    /// Effect running the current node on a copy of the record.
    pub fn step(&self) -> BoxedEffect<ConversationState, DispatchError, Env> {
        let Some(node) = self.cursor else {
            return fail(DispatchError::PassEnded).boxed();
        };
        let Some(action) = self.graph.action(node) else {
            return fail(DispatchError::MissingAction { node }).boxed();
        };
        action(self.state.clone())
    }

    /// Record the node's result and follow the first matching edge.
    pub fn apply_result(&mut self, next: ConversationState) -> Result<(), DispatchError> {
        let node = self.cursor.ok_or(DispatchError::PassEnded)?;

        self.trace = self.trace.record(StateTransition {
            from: self.state.status,
            to: next.status,
            timestamp: Utc::now(),
            turn: next.turn,
        });
        self.state = next;

        self.cursor = match self.graph.next(node, &self.state) {
            Some(Target::Node(to)) => Some(to),
            Some(Target::End) => None,
            None => {
                return Err(DispatchError::NoTransition {
                    node,
                    status: self.state.status,
                })
            }
        };
        Ok(())
    }

    /// Run nodes until the pass leaves the graph.
    pub async fn run(&mut self, env: &Env) -> Result<(), DispatchError> {
        while !self.is_done() {
            let next = self.step().run(env).await?;
            self.apply_result(next)?;
        }
        Ok(())
    }
}

impl<Env> std::fmt::Debug for DispatchMachine<Env> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchMachine")
            .field("cursor", &self.cursor)
            .field("status", &self.state.status)
            .field("turn", &self.state.turn)
            .finish_non_exhaustive()
    }
}
