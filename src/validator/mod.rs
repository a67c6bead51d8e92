//! Safety gate between resolvers and hardware.
//!
//! Every candidate passes through [`Validator::check`]. Rules are pure and
//! accumulate: an LED candidate with both a bad room and a bad state
//! reports both problems.

mod rules;

pub use rules::{Rejection, TemperatureBounds, DEFAULT_SETPOINT, MAX_TEMP, MIN_TEMP};

use crate::action::{Action, RawAction};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::debug;

/// Outcome of checking a single candidate.
pub type Checked = Validation<Action, NonEmptyVec<Rejection>>;

/// Converts raw candidates into safe, canonical actions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Validator {
    bounds: TemperatureBounds,
}

impl Validator {
    pub fn new(bounds: TemperatureBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> TemperatureBounds {
        self.bounds
    }

    /// Check one candidate, collecting every rejection.
    pub fn check(&self, raw: &RawAction) -> Checked {
        match raw.kind().as_str() {
            "SET_TEMP" => rules::temperature(raw, self.bounds),
            "FAN" => rules::fan(raw),
            "LED" => rules::light(raw),
            other => Validation::fail(Rejection::UnknownType {
                kind: other.to_string(),
            }),
        }
    }

    /// The canonical action for `raw`, or `None` when it is rejected.
    pub fn validate_action(&self, raw: &RawAction) -> Option<Action> {
        match self.check(raw) {
            Validation::Success(action) => Some(action),
            Validation::Failure(_) => None,
        }
    }

    /// Keep the valid candidates, in input order. Rejections are logged and
    /// dropped.
    pub fn validate_actions(&self, raws: &[RawAction]) -> Vec<Action> {
        let mut actions = Vec::with_capacity(raws.len());
        for raw in raws {
            match self.check(raw) {
                Validation::Success(action) => actions.push(action),
                Validation::Failure(rejections) => {
                    let reasons: Vec<String> = rejections.iter().map(|r| r.to_string()).collect();
                    debug!(candidate = ?raw, reasons = ?reasons, "dropping action candidate");
                }
            }
        }
        actions
    }
}
