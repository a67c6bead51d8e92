//! Canonical device actions.
//!
//! Three devices are controllable: the temperature set-point display, the
//! fan relay, and one light per room. Every action that reaches hardware is
//! an [`Action`] produced by the validator; raw resolver output is carried as
//! [`RawAction`] until then.

mod line;
mod raw;

pub use line::{actions_to_text, parse_canonical_line};
pub use raw::RawAction;
pub(crate) use raw::scalar_text;

use serde::{Deserialize, Serialize};
use std::fmt;

/// On/off state of a fan or light.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    /// Normalize a loose state word (`on/open/1/true`, `off/close/0/false`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "on" | "open" | "1" | "true" => Some(Self::On),
            "off" | "close" | "0" | "false" => Some(Self::Off),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

/// Room a light belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Location {
    Kitchen,
    Living,
    Guest,
}

impl Location {
    pub const ALL: [Location; 3] = [Location::Kitchen, Location::Living, Location::Guest];

    /// Normalize a room name or the colour of its LED (red/green/yellow).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "KITCHEN" | "RED" => Some(Self::Kitchen),
            "LIVING" | "GREEN" => Some(Self::Living),
            "GUEST" | "YELLOW" => Some(Self::Guest),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kitchen => "KITCHEN",
            Self::Living => "LIVING",
            Self::Guest => "GUEST",
        }
    }
}

/// A validated device action.
///
/// Serializes to the JSON shape exchanged with the language model and kept
/// in the history log:
///
/// ```rust
/// use hearth::action::{Action, Location, Switch};
///
/// let action = Action::Light { location: Location::Guest, state: Switch::On, duration: None };
/// let json = serde_json::to_string(&action).unwrap();
/// assert_eq!(json, r#"{"type":"LED","location":"GUEST","state":"on"}"#);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    /// Set-point in whole degrees Celsius.
    #[serde(rename = "SET_TEMP")]
    SetTemperature { value: i32 },

    #[serde(rename = "FAN")]
    Fan {
        state: Switch,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
    },

    #[serde(rename = "LED")]
    Light {
        location: Location,
        state: Switch,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
    },
}

impl Action {
    /// Tag used in JSON and by the validator.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetTemperature { .. } => "SET_TEMP",
            Self::Fan { .. } => "FAN",
            Self::Light { .. } => "LED",
        }
    }

    /// Legacy controller line, e.g. `LIGHT KITCHEN OFF DURATION=3`.
    pub fn to_canonical_line(&self) -> String {
        match self {
            Self::SetTemperature { value } => format!("SET_TEMP {value}"),
            Self::Fan { state, duration } => {
                with_duration(format!("FAN {}", state.as_str().to_uppercase()), *duration)
            }
            Self::Light {
                location,
                state,
                duration,
            } => with_duration(
                format!(
                    "LIGHT {} {}",
                    location.as_str(),
                    state.as_str().to_uppercase()
                ),
                *duration,
            ),
        }
    }
}

fn with_duration(line: String, duration: Option<u64>) -> String {
    match duration {
        Some(seconds) => format!("{line} DURATION={seconds}"),
        None => line,
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_line())
    }
}
