//! Unvalidated action candidates.

use super::Action;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A loosely-typed action object as produced by a resolver.
///
/// Nothing about the contents is trusted: keys may be missing, values may
/// have the wrong JSON type, the `type` tag may be unknown. The validator
/// is the only way to turn one into an [`Action`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawAction(Map<String, Value>);

impl RawAction {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a JSON value; anything other than an object is refused.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The `type` tag, trimmed and upper-cased; empty when absent.
    pub fn kind(&self) -> String {
        self.get("type")
            .and_then(scalar_text)
            .map(|t| t.trim().to_uppercase())
            .unwrap_or_default()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<&Action> for RawAction {
    fn from(action: &Action) -> Self {
        match action {
            Action::SetTemperature { value } => {
                RawAction::new().with("type", "SET_TEMP").with("value", *value)
            }
            Action::Fan { state, duration } => {
                let raw = RawAction::new()
                    .with("type", "FAN")
                    .with("state", state.as_str());
                match duration {
                    Some(seconds) => raw.with("duration", *seconds),
                    None => raw,
                }
            }
            Action::Light {
                location,
                state,
                duration,
            } => {
                let raw = RawAction::new()
                    .with("type", "LED")
                    .with("location", location.as_str())
                    .with("state", state.as_str());
                match duration {
                    Some(seconds) => raw.with("duration", *seconds),
                    None => raw,
                }
            }
        }
    }
}

impl From<Action> for RawAction {
    fn from(action: Action) -> Self {
        RawAction::from(&action)
    }
}

/// Text form of a scalar JSON value: strings as-is, numbers in their JSON
/// spelling, booleans as `true`/`false`. Null, arrays and objects have none.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
