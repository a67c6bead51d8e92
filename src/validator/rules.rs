//! Per-device validation rules.

use crate::action::{scalar_text, Action, Location, RawAction, Switch};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Lowest set-point the display accepts, in °C.
pub const MIN_TEMP: f64 = 18.0;
/// Highest set-point the display accepts, in °C.
pub const MAX_TEMP: f64 = 30.0;
/// Set-point assumed when the current one is unknown.
pub const DEFAULT_SETPOINT: i32 = 25;

/// Why a candidate was refused.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Rejection {
    /// The `type` tag is missing or not one of SET_TEMP/FAN/LED
    #[error("unknown action type '{kind}'")]
    UnknownType { kind: String },

    /// SET_TEMP without a `value`
    #[error("temperature action has no value")]
    MissingValue,

    /// SET_TEMP value that is not a finite number
    #[error("temperature value '{raw}' is not a number")]
    NonNumericValue { raw: String },

    #[error("unknown switch state '{raw}'")]
    UnknownState { raw: String },

    #[error("unknown light location '{raw}'")]
    UnknownLocation { raw: String },
}

/// Inclusive set-point range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemperatureBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for TemperatureBounds {
    fn default() -> Self {
        Self {
            min: MIN_TEMP,
            max: MAX_TEMP,
        }
    }
}

impl TemperatureBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whole degrees inside the range, or `None` when there are none
    /// (inverted, NaN or too narrow bounds).
    pub fn whole_degrees(&self) -> Option<(i32, i32)> {
        if !(self.min.is_finite() && self.max.is_finite()) {
            return None;
        }
        let (low, high) = (self.min.ceil(), self.max.floor());
        (low <= high).then_some((low as i32, high as i32))
    }

    /// Clamp, round half up, then clamp again to the whole-degree range.
    ///
    /// Unusable bounds fall back to the default 18..=30 range.
    pub fn settle(&self, value: f64) -> i32 {
        let bounds = match self.whole_degrees() {
            Some(_) => *self,
            None => Self::default(),
        };
        let clamped = value.clamp(bounds.min, bounds.max);
        let rounded = (clamped + 0.5).floor() as i32;
        let (low, high) = bounds.whole_degrees().unwrap_or((18, 30));
        rounded.clamp(low, high)
    }
}

type Rule<T> = Validation<T, NonEmptyVec<Rejection>>;

pub(super) fn temperature(raw: &RawAction, bounds: TemperatureBounds) -> Rule<Action> {
    let Some(value) = raw.get("value") else {
        return Validation::fail(Rejection::MissingValue);
    };
    match number(value) {
        Some(v) if v.is_finite() => Validation::success(Action::SetTemperature {
            value: bounds.settle(v),
        }),
        _ => Validation::fail(Rejection::NonNumericValue {
            raw: value.to_string(),
        }),
    }
}

pub(super) fn fan(raw: &RawAction) -> Rule<Action> {
    state(raw).map(|state| Action::Fan {
        state,
        duration: duration(raw),
    })
}

pub(super) fn light(raw: &RawAction) -> Rule<Action> {
    match (location(raw), state(raw)) {
        (Validation::Success(location), Validation::Success(state)) => {
            Validation::success(Action::Light {
                location,
                state,
                duration: duration(raw),
            })
        }
        (location, state) => {
            match Validation::all_vec(vec![location.map(|_| ()), state.map(|_| ())]) {
                Validation::Failure(errors) => Validation::Failure(errors),
                Validation::Success(_) => unreachable!("at least one check failed"),
            }
        }
    }
}

fn state(raw: &RawAction) -> Rule<Switch> {
    let text = raw.get("state").and_then(scalar_text).unwrap_or_default();
    match Switch::parse(&text) {
        Some(state) => Validation::success(state),
        None => Validation::fail(Rejection::UnknownState { raw: text }),
    }
}

fn location(raw: &RawAction) -> Rule<Location> {
    let text = raw.get("location").and_then(scalar_text).unwrap_or_default();
    match Location::parse(&text) {
        Some(location) => Validation::success(location),
        None => Validation::fail(Rejection::UnknownLocation { raw: text }),
    }
}

/// Numbers and numeric strings; everything else is not a number.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Seconds, kept only when non-negative. Floats truncate.
fn duration(raw: &RawAction) -> Option<u64> {
    let seconds = match raw.get("duration")? {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => {
                let f = n.as_f64()?;
                if !f.is_finite() {
                    return None;
                }
                f.trunc() as i64
            }
        },
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    u64::try_from(seconds).ok()
}
