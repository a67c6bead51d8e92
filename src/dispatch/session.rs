//! A conversation: turns run until a terminal status.

use super::env::DispatchEnv;
use super::graph::{DispatchGraph, Node};
use super::machine::DispatchMachine;
use super::nodes::standard_graph;
use super::state::{ConversationState, DeviceSnapshot, ParseSource};
use super::status::TurnStatus;
use super::DispatchError;
use crate::action::Action;
use crate::core::StateHistory;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use stillwater::effect::Effect;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// What one turn did.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TurnReport {
    pub turn: u32,
    pub input: String,
    /// Status left by `check_end`
    pub status: TurnStatus,
    /// How execution ended, before history and end checks
    pub outcome: Option<TurnStatus>,
    pub actions: Vec<Action>,
    pub parse_source: ParseSource,
    pub failure_count: u32,
}

/// Summary of a finished conversation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionReport {
    pub id: Uuid,
    pub final_status: TurnStatus,
    pub turns: Vec<TurnReport>,
    /// Wall time from the first to the last status change
    pub duration: Option<Duration>,
    /// Whether any turn had to ask the user again
    pub clarified: bool,
}

/// Drives the dispatch graph for one conversation.
///
/// A pass ending in `needs_clarification` is followed by the clarification
/// node at the start of the next turn; terminal statuses stop the session.
/// Turns must be awaited inside a tokio runtime: node bodies run on its
/// blocking pool.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    env: DispatchEnv,
    machine: DispatchMachine<DispatchEnv>,
}

impl Session {
    /// Session over the standard graph.
    pub fn new(env: DispatchEnv, devices: DeviceSnapshot) -> Result<Self, DispatchError> {
        Ok(Self::with_graph(env, Arc::new(standard_graph()?), devices))
    }

    pub fn with_graph(
        env: DispatchEnv,
        graph: Arc<DispatchGraph<DispatchEnv>>,
        devices: DeviceSnapshot,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            env,
            machine: DispatchMachine::new(graph, ConversationState::new(devices)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &ConversationState {
        self.machine.state()
    }

    pub fn trace(&self) -> &StateHistory<TurnStatus> {
        self.machine.trace()
    }

    pub fn is_finished(&self) -> bool {
        self.machine.is_final()
    }

    /// Run one intake through to its end-of-turn check.
    pub async fn run_turn(&mut self) -> Result<TurnReport, DispatchError> {
        if self.machine.is_final() {
            return Err(DispatchError::SessionEnded);
        }
        if self.machine.is_done() {
            self.machine.resume_at(Node::ClarifyOrContinue);
        }

        let span = info_span!("turn", session = %self.id, turn = self.machine.state().turn + 1);
        async {
            let mut heard = false;
            let mut end_status = None;
            loop {
                let node = self.machine.current_node();
                let next = self.machine.step().run(&self.env).await?;
                self.machine.apply_result(next)?;

                match node {
                    Some(Node::Intake) => heard = true,
                    Some(Node::CheckEnd) => end_status = Some(self.machine.state().status),
                    _ => {}
                }
                let next_turn = heard && self.machine.current_node() == Some(Node::Intake);
                if self.machine.is_done() || next_turn {
                    break;
                }
            }

            let state = self.machine.state();
            let report = TurnReport {
                turn: state.turn,
                input: state.input_text.clone(),
                status: end_status.unwrap_or(state.status),
                outcome: state.outcome,
                actions: state.validated_actions.clone(),
                parse_source: state.parse_source,
                failure_count: state.failure_count,
            };
            info!(status = %report.status, actions = report.actions.len(), "turn finished");
            Ok::<_, DispatchError>(report)
        }
        .instrument(span)
        .await
    }

    /// Run turns until the conversation ends.
    pub async fn run(&mut self) -> Result<SessionReport, DispatchError> {
        let mut turns = Vec::new();
        while !self.machine.is_final() {
            turns.push(self.run_turn().await?);
        }

        let trace = self.machine.trace();
        let report = SessionReport {
            id: self.id,
            final_status: self.machine.state().status,
            turns,
            duration: trace.duration(),
            clarified: trace.visited(&TurnStatus::NeedsClarification),
        };
        info!(
            session = %report.id,
            status = %report.final_status,
            turns = report.turns.len(),
            duration = ?report.duration,
            "session ended"
        );
        Ok(report)
    }
}
