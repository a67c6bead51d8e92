//! Legacy one-action-per-line format:
//!
//! ```text
//! SET_TEMP 26
//! FAN ON DURATION=3
//! LIGHT KITCHEN OFF
//! ```

use super::{Action, Location, Switch};

/// Render actions one per line, with a trailing newline when non-empty.
pub fn actions_to_text(actions: &[Action]) -> String {
    let mut out = String::new();
    for action in actions {
        out.push_str(&action.to_canonical_line());
        out.push('\n');
    }
    out
}

/// Parse one legacy line.
///
/// Keywords are case-insensitive and a `DURATION=n` token may appear
/// anywhere. Blank lines and `#` comments yield `None`, as does anything
/// that is not one of the three line shapes. Values are not clamped here;
/// run the result through the validator before use.
pub fn parse_canonical_line(line: &str) -> Option<Action> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut duration = None;
    let mut parts = Vec::new();
    for token in line.split_whitespace() {
        match split_duration(token) {
            Some(value) => duration = value,
            None => parts.push(token),
        }
    }

    let head = parts.first()?.to_uppercase();
    match head.as_str() {
        "SET_TEMP" => {
            let value: f64 = parts.get(1)?.parse().ok()?;
            if !value.is_finite() {
                return None;
            }
            Some(Action::SetTemperature {
                value: value.trunc() as i32,
            })
        }
        "FAN" => Some(Action::Fan {
            state: strict_switch(parts.get(1)?)?,
            duration,
        }),
        "LIGHT" => Some(Action::Light {
            location: Location::parse(parts.get(1)?)?,
            state: strict_switch(parts.get(2)?)?,
            duration,
        }),
        _ => None,
    }
}

/// `Some(parsed)` when the token is a `DURATION=` token, `None` otherwise.
fn split_duration(token: &str) -> Option<Option<u64>> {
    let (key, value) = token.split_once('=')?;
    if !key.eq_ignore_ascii_case("DURATION") {
        return None;
    }
    Some(value.parse().ok())
}

fn strict_switch(token: &str) -> Option<Switch> {
    match token.to_lowercase().as_str() {
        "on" => Some(Switch::On),
        "off" => Some(Switch::Off),
        _ => None,
    }
}
