//! Property-based tests for the validator, action lines, rule rewriting,
//! the history ring and the status trace.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use chrono::Utc;
use hearth::action::{parse_canonical_line, Action, Location, RawAction, Switch};
use hearth::core::{Guard, State, StateHistory, StateTransition};
use hearth::dispatch::TurnStatus;
use hearth::fastpath::{match_utterance, EXPLICIT_RANGE};
use hearth::memory::{apply_rules, HistoryLog, Rule};
use hearth::validator::{TemperatureBounds, Validator};
use proptest::prelude::*;
use serde_json::{json, Value};

prop_compose! {
    fn arbitrary_switch()(on in any::<bool>()) -> Switch {
        if on { Switch::On } else { Switch::Off }
    }
}

prop_compose! {
    fn arbitrary_location()(index in 0..3usize) -> Location {
        Location::ALL[index]
    }
}

fn arbitrary_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (18..=30i32).prop_map(|value| Action::SetTemperature { value }),
        (arbitrary_switch(), proptest::option::of(0..10_000u64))
            .prop_map(|(state, duration)| Action::Fan { state, duration }),
        (
            arbitrary_location(),
            arbitrary_switch(),
            proptest::option::of(0..10_000u64)
        )
            .prop_map(|(location, state, duration)| Action::Light {
                location,
                state,
                duration
            }),
    ]
}

fn arbitrary_field() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-100.0..100.0f64).prop_map(|v| json!(v)),
        (-50..50i64).prop_map(|v| json!(v)),
        any::<bool>().prop_map(|v| json!(v)),
        prop::sample::select(vec![
            "on", "OFF", "open", "close", "1", "0", "dim", "red", "GREEN", "yellow", "kitchen",
            "attic", "24", " 26.6 ", "warm", "",
        ])
        .prop_map(|v| json!(v)),
    ]
}

prop_compose! {
    fn arbitrary_candidate()(
        kind in prop::sample::select(vec!["SET_TEMP", "set_temp", "FAN", "LED", "led", "TV", ""]),
        value in proptest::option::of(arbitrary_field()),
        state in proptest::option::of(arbitrary_field()),
        location in proptest::option::of(arbitrary_field()),
        duration in proptest::option::of(arbitrary_field()),
    ) -> RawAction {
        let mut raw = RawAction::new().with("type", kind);
        for (key, field) in [("value", value), ("state", state), ("location", location), ("duration", duration)] {
            if let Some(field) = field {
                raw = raw.with(key, field);
            }
        }
        raw
    }
}

prop_compose! {
    fn arbitrary_status()(index in 0..8usize) -> TurnStatus {
        [
            TurnStatus::Start,
            TurnStatus::Analyzed,
            TurnStatus::FastpathParsed,
            TurnStatus::Validated,
            TurnStatus::Executed,
            TurnStatus::HistoryUpdated,
            TurnStatus::NeedsClarification,
            TurnStatus::TooManyFailures,
        ][index]
    }
}

proptest! {
    #[test]
    fn validation_is_idempotent(candidates in prop::collection::vec(arbitrary_candidate(), 0..12)) {
        let validator = Validator::default();
        let once = validator.validate_actions(&candidates);
        let again: Vec<RawAction> = once.iter().map(RawAction::from).collect();
        prop_assert_eq!(validator.validate_actions(&again), once);
    }

    #[test]
    fn temperature_always_lands_in_range(value in -1.0e6..1.0e6f64) {
        let raw = RawAction::new().with("type", "SET_TEMP").with("value", value);
        match Validator::default().validate_action(&raw) {
            Some(Action::SetTemperature { value }) => prop_assert!((18..=30).contains(&value)),
            other => prop_assert!(false, "unexpected result {:?}", other),
        }
    }

    #[test]
    fn any_bounds_settle_without_panicking(
        min in prop_oneof![Just(f64::NAN), -50.0..50.0f64],
        max in prop_oneof![Just(f64::NAN), -50.0..50.0f64],
        value in -100.0..100.0f64,
    ) {
        let raw = RawAction::new().with("type", "SET_TEMP").with("value", value);
        let actions = Validator::new(TemperatureBounds::new(min, max)).validate_actions(&[raw]);
        prop_assert_eq!(actions.len(), 1);
    }

    #[test]
    fn canonical_line_round_trip(action in arbitrary_action()) {
        let line = action.to_canonical_line();
        prop_assert_eq!(parse_canonical_line(&line), Some(action.clone()));
        prop_assert_eq!(parse_canonical_line(&line.to_lowercase()), Some(action));
    }

    #[test]
    fn history_ring_keeps_newest(pushes in 1..12usize) {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("history.jsonl"), 5);
        for i in 0..pushes {
            log.push(&format!("utterance {i}"), json!({"n": i})).unwrap();
        }

        let records = log.load().unwrap();
        prop_assert_eq!(records.len(), pushes.min(5));
        let last = records.last().unwrap();
        prop_assert_eq!(&last.user, &format!("utterance {}", pushes - 1));
        let first_kept = pushes.saturating_sub(5);
        prop_assert_eq!(&records[0].user, &format!("utterance {first_kept}"));
    }

    #[test]
    fn rule_rewrite_inserts_meaning(prefix in "[a-z ]{0,6}", suffix in "[a-z ]{0,6}") {
        let rules = [Rule::new("熱一點", "SET_TEMP 24")];
        let rewritten = apply_rules(&format!("{prefix}熱一點{suffix}"), &rules);
        prop_assert!(rewritten.contains("SET_TEMP 24"));
        prop_assert!(!rewritten.contains("熱一點"));
    }

    #[test]
    fn guard_is_deterministic(status in arbitrary_status()) {
        let guard = Guard::new(|s: &TurnStatus| s.ends_pass());
        prop_assert_eq!(guard.check(&status), guard.check(&status));
        prop_assert_eq!(guard.negate().check(&status), !guard.check(&status));
    }

    #[test]
    fn status_name_matches_serialized_form(status in arbitrary_status()) {
        let json = serde_json::to_value(status).unwrap();
        prop_assert_eq!(json, Value::from(status.name()));
        let back: TurnStatus = serde_json::from_value(Value::from(status.name())).unwrap();
        prop_assert_eq!(back, status);
    }

    #[test]
    fn trace_preserves_order(statuses in prop::collection::vec(arbitrary_status(), 1..10)) {
        let mut trace = StateHistory::new();
        let mut expected = vec![TurnStatus::Start];

        for (i, to) in statuses.iter().enumerate() {
            let from = if i == 0 { TurnStatus::Start } else { statuses[i - 1] };
            trace = trace.record(StateTransition {
                from,
                to: *to,
                timestamp: Utc::now(),
                turn: 1 + i as u32 / 3,
            });
            expected.push(*to);
        }

        let path: Vec<TurnStatus> = trace.get_path().into_iter().copied().collect();
        prop_assert_eq!(path, expected);

        let json = serde_json::to_string(&trace).unwrap();
        let back: StateHistory<TurnStatus> = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.transitions().len(), trace.transitions().len());
    }

    #[test]
    fn trace_record_is_pure(from in arbitrary_status(), to in arbitrary_status()) {
        let trace = StateHistory::new();
        let next = trace.record(StateTransition { from, to, timestamp: Utc::now(), turn: 1 });
        prop_assert_eq!(trace.transitions().len(), 0);
        prop_assert_eq!(next.transitions().len(), 1);
    }
}

#[test]
fn clamp_examples() {
    let validator = Validator::default();
    for (input, expected) in [(31.0, 30), (17.0, 18), (25.5, 26), (25.4, 25)] {
        let raw = RawAction::new().with("type", "SET_TEMP").with("value", input);
        assert_eq!(
            validator.validate_action(&raw),
            Some(Action::SetTemperature { value: expected }),
            "input {input}"
        );
    }
}

#[test]
fn history_ring_after_eight_pushes() {
    let dir = tempfile::tempdir().unwrap();
    let log = HistoryLog::new(dir.path().join("history.jsonl"), 5);
    for i in 0..8 {
        log.push(&format!("u{i}"), json!({ "i": i })).unwrap();
    }
    let users: Vec<String> = log.load().unwrap().into_iter().map(|r| r.user).collect();
    assert_eq!(users, vec!["u3", "u4", "u5", "u6", "u7"]);

    let on_disk = std::fs::read_to_string(log.path()).unwrap();
    assert_eq!(on_disk.lines().count(), 5);
}

#[test]
fn mixed_polarity_defers() {
    assert!(match_utterance("開燈然後關燈", 25, &EXPLICIT_RANGE).is_none());
}
