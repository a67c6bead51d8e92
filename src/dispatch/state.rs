//! The working record of a conversation.

use super::status::TurnStatus;
use crate::action::{Action, Location, RawAction, Switch};
use crate::memory::Rule;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which resolver produced the turn's candidates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseSource {
    #[serde(rename = "fastpath")]
    FastPath,
    Llm,
    #[default]
    None,
}

/// Last known device state, updated only after successful actuator calls.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub setpoint: Option<i32>,
    pub fan: Option<Switch>,
    pub lights: BTreeMap<Location, Switch>,
}

impl DeviceSnapshot {
    pub fn with_setpoint(setpoint: i32) -> Self {
        Self {
            setpoint: Some(setpoint),
            ..Self::default()
        }
    }

    /// Record that `action` reached the hardware.
    pub fn apply(&mut self, action: &Action) {
        match action {
            Action::SetTemperature { value } => self.setpoint = Some(*value),
            Action::Fan { state, .. } => self.fan = Some(*state),
            Action::Light {
                location, state, ..
            } => {
                self.lights.insert(*location, *state);
            }
        }
    }
}

/// Everything the graph nodes read and write.
///
/// Owned by one session and touched only by the node currently running.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub input_text: String,
    pub raw_actions: Vec<RawAction>,
    pub validated_actions: Vec<Action>,
    pub status: TurnStatus,
    pub needs_clarification: bool,
    pub clarification_message: Option<String>,
    pub parse_source: ParseSource,
    /// Model reply, kept for the history log
    pub llm_reply: Option<String>,
    pub error_message: Option<String>,
    /// Set on every non-blank intake; the idle clock runs from here
    pub last_input_time: Option<DateTime<Utc>>,
    /// Consecutive turns that needed clarification
    pub failure_count: u32,
    /// 1-based turn number, bumped by every intake
    pub turn: u32,
    pub devices: DeviceSnapshot,
    pub learned_rule: Option<Rule>,
    /// How the last turn's execution step ended, before history and
    /// end-of-turn checks overwrote `status`
    pub outcome: Option<TurnStatus>,
}

impl ConversationState {
    pub fn new(devices: DeviceSnapshot) -> Self {
        Self {
            devices,
            ..Self::default()
        }
    }

    /// Clear per-turn fields ahead of a new intake. Counters, the device
    /// snapshot and the idle clock carry over.
    pub fn begin_turn(&mut self) {
        self.turn += 1;
        self.input_text.clear();
        self.raw_actions.clear();
        self.validated_actions.clear();
        self.parse_source = ParseSource::None;
        self.llm_reply = None;
        self.error_message = None;
        self.learned_rule = None;
        self.outcome = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_source_wire_names() {
        assert_eq!(serde_json::to_value(ParseSource::FastPath).unwrap(), "fastpath");
        assert_eq!(serde_json::to_value(ParseSource::Llm).unwrap(), "llm");
        assert_eq!(serde_json::to_value(ParseSource::None).unwrap(), "none");
    }

    #[test]
    fn snapshot_tracks_actions() {
        let mut devices = DeviceSnapshot::with_setpoint(25);
        devices.apply(&Action::SetTemperature { value: 23 });
        devices.apply(&Action::Fan {
            state: Switch::On,
            duration: Some(60),
        });
        devices.apply(&Action::Light {
            location: Location::Living,
            state: Switch::Off,
            duration: None,
        });

        assert_eq!(devices.setpoint, Some(23));
        assert_eq!(devices.fan, Some(Switch::On));
        assert_eq!(devices.lights.get(&Location::Living), Some(&Switch::Off));
        assert_eq!(devices.lights.get(&Location::Kitchen), None);
    }

    #[test]
    fn begin_turn_keeps_counters() {
        let mut state = ConversationState::new(DeviceSnapshot::with_setpoint(26));
        state.failure_count = 2;
        state.input_text = "開燈".into();
        state.llm_reply = Some("[]".into());
        state.last_input_time = Some(Utc::now());

        state.begin_turn();

        assert_eq!(state.turn, 1);
        assert_eq!(state.failure_count, 2);
        assert!(state.input_text.is_empty());
        assert!(state.llm_reply.is_none());
        assert!(state.last_input_time.is_some());
        assert_eq!(state.devices.setpoint, Some(26));
    }

    #[test]
    fn state_serializes() {
        let mut state = ConversationState::default();
        state.devices.apply(&Action::Light {
            location: Location::Guest,
            state: Switch::On,
            duration: None,
        });
        let json = serde_json::to_string(&state).unwrap();
        let back: ConversationState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
