//! Node bodies and the standard conversation graph.
//!
//! Each body is a plain function from the current record and environment
//! to the next record; [`standard_graph`] lifts them into effects.
//! Bodies block on collaborators (microphone, actuators, model backoff), so
//! the lifted effect runs them on tokio's blocking pool.

use super::env::DispatchEnv;
use super::graph::{BuildError, DispatchGraph, GraphBuilder, Node, NodeAction, Target};
use super::state::{ConversationState, ParseSource};
use super::status::TurnStatus;
use super::DispatchError;
use crate::action::Action;
use crate::core::Guard;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use stillwater::prelude::*;
use tracing::{debug, info, warn};

/// Reply after an utterance nobody could make sense of.
pub const PARSE_FAILURE_MESSAGE: &str = "抱歉，我無法理解您的指令。請重新說一次，例如：開啟廚房燈。";

const REPROMPT_ZH: &str = "請再說一次，我沒聽清楚。";
const REPROMPT_EN: &str = "Please say that again, I didn't catch it.";

type NodeFn = fn(&ConversationState, &DispatchEnv) -> Result<ConversationState, DispatchError>;

fn lift(body: NodeFn) -> NodeAction<DispatchEnv> {
    Arc::new(move |state: ConversationState| {
        from_async(move |env: &DispatchEnv| {
            let env = env.clone();
            async move {
                tokio::task::spawn_blocking(move || body(&state, &env))
                    .await
                    .map_err(|e| DispatchError::Worker(e.to_string()))?
            }
        })
        .boxed()
    })
}

/// intake → parse → validate → (execute | clarify) → history → check_end,
/// looping through `clarify_or_continue` while nothing ends the pass.
pub fn standard_graph() -> Result<DispatchGraph<DispatchEnv>, BuildError> {
    let clarifying = Guard::new(|s: &ConversationState| s.needs_clarification);
    GraphBuilder::new()
        .entry(Node::Intake)
        .node(Node::Intake, lift(intake))
        .node(Node::ParseActions, lift(parse_actions))
        .node(Node::ValidateActions, lift(validate_actions))
        .node(Node::ExecuteHardware, lift(execute_hardware))
        .node(Node::UpdateHistory, lift(update_history))
        .node(Node::CheckEnd, lift(check_end))
        .node(Node::ClarifyOrContinue, lift(clarify_or_continue))
        .edge(Node::Intake, Node::ParseActions)
        .edge(Node::ParseActions, Node::ValidateActions)
        .branch(Node::ValidateActions, Node::UpdateHistory, clarifying.clone())
        .branch(Node::ValidateActions, Node::ExecuteHardware, clarifying.negate())
        .edge(Node::ExecuteHardware, Node::UpdateHistory)
        .edge(Node::UpdateHistory, Node::CheckEnd)
        .branch(
            Node::CheckEnd,
            Target::End,
            Guard::new(|s: &ConversationState| s.status.ends_pass()),
        )
        .edge(Node::CheckEnd, Node::ClarifyOrContinue)
        .edge(Node::ClarifyOrContinue, Node::Intake)
        .build()
}

pub fn intake(
    state: &ConversationState,
    env: &DispatchEnv,
) -> Result<ConversationState, DispatchError> {
    let mut next = state.clone();
    next.begin_turn();

    let heard = env.transcriber.listen();
    let text = heard.trim();
    if text.is_empty() {
        debug!("nothing transcribed");
        next.status = TurnStatus::AnalyzeError;
    } else {
        debug!(text, "heard");
        next.input_text = text.to_string();
        next.last_input_time = Some(Utc::now());
        next.status = TurnStatus::Analyzed;
    }
    Ok(next)
}

pub fn parse_actions(
    state: &ConversationState,
    env: &DispatchEnv,
) -> Result<ConversationState, DispatchError> {
    let mut next = state.clone();
    if state.status == TurnStatus::AnalyzeError || state.input_text.is_empty() {
        next.status = TurnStatus::ParseFailed;
        return Ok(next);
    }

    match env.fastpath.learn(&state.input_text) {
        Ok(Some(rule)) => {
            next.learned_rule = Some(rule);
            next.status = TurnStatus::RuleLearned;
            return Ok(next);
        }
        Ok(None) => {}
        Err(e) => {
            warn!(error = %e, "could not store taught rule");
            next.error_message = Some(e.to_string());
            next.status = TurnStatus::ParseFailed;
            return Ok(next);
        }
    }

    let setpoint = state.devices.setpoint.unwrap_or(env.default_setpoint);
    if let Some(hit) = env.fastpath.resolve(&state.input_text, setpoint) {
        next.raw_actions = hit.candidates;
        next.parse_source = ParseSource::FastPath;
        next.status = TurnStatus::FastpathParsed;
        return Ok(next);
    }

    let resolution = env.llm.resolve(&state.input_text, Some(setpoint));
    next.parse_source = ParseSource::Llm;
    next.llm_reply = resolution.raw_reply;
    next.error_message = resolution.error;
    if resolution.candidates.is_empty() {
        next.status = TurnStatus::ParseFailed;
    } else {
        next.raw_actions = resolution.candidates;
        next.status = TurnStatus::LlmParsed;
    }
    Ok(next)
}

pub fn validate_actions(
    state: &ConversationState,
    env: &DispatchEnv,
) -> Result<ConversationState, DispatchError> {
    let mut next = state.clone();
    match state.status {
        TurnStatus::ParseFailed | TurnStatus::AnalyzeError => {
            next.validated_actions.clear();
            clarify(&mut next, Some(PARSE_FAILURE_MESSAGE.to_string()));
        }
        TurnStatus::RuleLearned => {
            next.validated_actions.clear();
        }
        _ => {
            next.validated_actions = env.validator.validate_actions(&state.raw_actions);
            if next.validated_actions.is_empty() {
                debug!(candidates = state.raw_actions.len(), "every candidate rejected");
                clarify(&mut next, None);
            } else {
                next.failure_count = 0;
                next.status = TurnStatus::Validated;
            }
        }
    }
    Ok(next)
}

fn clarify(state: &mut ConversationState, message: Option<String>) {
    state.needs_clarification = true;
    state.clarification_message = message;
    state.failure_count += 1;
    state.status = TurnStatus::NeedsClarification;
    state.outcome = Some(TurnStatus::NeedsClarification);
}

pub fn execute_hardware(
    state: &ConversationState,
    env: &DispatchEnv,
) -> Result<ConversationState, DispatchError> {
    let mut next = state.clone();
    if state.validated_actions.is_empty() {
        if state.status != TurnStatus::RuleLearned {
            next.status = TurnStatus::NoActions;
        }
        next.outcome = Some(next.status);
        return Ok(next);
    }

    let mut errors = Vec::new();
    for action in &state.validated_actions {
        let result = match action {
            Action::SetTemperature { value } => env.actuators.set_temperature_display(*value),
            Action::Fan { state, .. } => env.actuators.set_fan(*state),
            Action::Light {
                location, state, ..
            } => env.actuators.set_light(*location, *state),
        };
        match result {
            Ok(()) => {
                info!(%action, "executed");
                next.devices.apply(action);
            }
            Err(e) => {
                warn!(%action, error = %e, "actuator failed");
                errors.push(e.to_string());
            }
        }
    }

    if errors.is_empty() {
        next.status = TurnStatus::Executed;
    } else {
        next.error_message = Some(errors.join("; "));
        next.status = TurnStatus::HardwareError;
    }
    next.outcome = Some(next.status);
    Ok(next)
}

pub fn update_history(
    state: &ConversationState,
    env: &DispatchEnv,
) -> Result<ConversationState, DispatchError> {
    let result = json!({
        "actions": state.validated_actions,
        "status": state.status,
        "parse_source": state.parse_source,
        "llm_reply": state.llm_reply,
        "error": state.error_message,
        "learned_rule": state.learned_rule,
    });
    if let Err(e) = env.history.push(&state.input_text, result) {
        warn!(error = %e, "failed to append turn to history");
    }

    let mut next = state.clone();
    next.status = TurnStatus::HistoryUpdated;
    Ok(next)
}

pub fn check_end(
    state: &ConversationState,
    env: &DispatchEnv,
) -> Result<ConversationState, DispatchError> {
    let mut next = state.clone();
    next.status = env.policy.evaluate(state, Utc::now());
    if next.status.ends_pass() {
        debug!(status = %next.status, failures = state.failure_count, "pass ends");
    }
    Ok(next)
}

pub fn clarify_or_continue(
    state: &ConversationState,
    env: &DispatchEnv,
) -> Result<ConversationState, DispatchError> {
    let message = if let Some(rule) = &state.learned_rule {
        Some(format!(
            "好的，我記住了：當你說「{}」就是「{}」。",
            rule.trigger, rule.meaning
        ))
    } else if state.needs_clarification {
        Some(
            state
                .clarification_message
                .clone()
                .unwrap_or_else(|| reprompt_for(&state.input_text).to_string()),
        )
    } else {
        None
    };

    if let Some(text) = message {
        if let Err(e) = env.replies.say(&text) {
            warn!(error = %e, "could not deliver reply");
        }
    }

    let mut next = state.clone();
    next.needs_clarification = false;
    next.clarification_message = None;
    next.status = TurnStatus::ReadyForNext;
    Ok(next)
}

/// Generic re-prompt in the language the user spoke.
pub fn reprompt_for(utterance: &str) -> &'static str {
    let cjk = utterance
        .chars()
        .any(|c| matches!(c, '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' | '\u{F900}'..='\u{FAFF}'));
    if cjk || utterance.trim().is_empty() {
        REPROMPT_ZH
    } else {
        REPROMPT_EN
    }
}
