//! Device-level intents recognized by the fast path.

use crate::action::{Action, Location, Switch};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentAction {
    TurnOn,
    TurnOff,
    SetTemp,
    LowerTemp,
    HigherTemp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    Light,
    Fan,
    Ac,
}

/// `{action, device, value}` plus the rooms a light command names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandIntent {
    pub action: IntentAction,
    pub device: Device,
    #[serde(default)]
    pub value: Option<i32>,
    /// Empty means every room.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rooms: Vec<Location>,
}

impl CommandIntent {
    pub fn new(action: IntentAction, device: Device) -> Self {
        Self {
            action,
            device,
            value: None,
            rooms: Vec::new(),
        }
    }

    pub fn set_temp(value: i32) -> Self {
        Self {
            value: Some(value),
            ..Self::new(IntentAction::SetTemp, Device::Ac)
        }
    }

    pub fn in_rooms(mut self, rooms: Vec<Location>) -> Self {
        self.rooms = rooms;
        self
    }

    /// Actions carrying out this intent, given the current set-point.
    ///
    /// `None` when the intent has no representable action (turning the AC
    /// off, or a malformed combination); the caller then defers.
    pub fn candidates(&self, setpoint: i32) -> Option<Vec<Action>> {
        let switch = match self.action {
            IntentAction::TurnOn => Some(Switch::On),
            IntentAction::TurnOff => Some(Switch::Off),
            _ => None,
        };

        match (self.device, self.action) {
            (Device::Light, IntentAction::TurnOn | IntentAction::TurnOff) => {
                let state = switch?;
                let rooms: &[Location] = if self.rooms.is_empty() {
                    &Location::ALL
                } else {
                    &self.rooms
                };
                Some(
                    rooms
                        .iter()
                        .map(|&location| Action::Light {
                            location,
                            state,
                            duration: None,
                        })
                        .collect(),
                )
            }
            (Device::Fan, IntentAction::TurnOn | IntentAction::TurnOff) => Some(vec![Action::Fan {
                state: switch?,
                duration: None,
            }]),
            (Device::Ac, IntentAction::TurnOn) => {
                Some(vec![Action::SetTemperature { value: setpoint }])
            }
            (Device::Ac, IntentAction::TurnOff) => None,
            (Device::Ac, IntentAction::SetTemp) => Some(vec![Action::SetTemperature {
                value: self.value?,
            }]),
            (Device::Ac, IntentAction::LowerTemp) => Some(vec![Action::SetTemperature {
                value: setpoint - 1,
            }]),
            (Device::Ac, IntentAction::HigherTemp) => Some(vec![Action::SetTemperature {
                value: setpoint + 1,
            }]),
            _ => None,
        }
    }
}
