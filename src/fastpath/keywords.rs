//! Keyword and regex heuristics, tried when no exact phrase matches.

use super::intent::{CommandIntent, Device, IntentAction};
use crate::action::Location;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::RangeInclusive;
use tracing::debug;

const NEGATIONS: &[&str] = &["不", "不要", "別", "不是"];

const ON_WORDS: &[&str] = &["開", "打開", "開啟", "on", "turn on", "open"];
const OFF_WORDS: &[&str] = &["關", "關掉", "關閉", "off", "turn off", "close"];

const LIGHT_WORDS: &[&str] = &["燈", "light", "lights", "lamp"];
const FAN_WORDS: &[&str] = &["風扇", "電扇", "電風扇", "fan", "fans"];
const AC_WORDS: &[&str] = &["冷氣", "空調", "ac", "air conditioner"];
const ALL_WORDS: &[&str] = &["全部", "所有", "all", "everything"];

const ROOM_WORDS: &[(Location, &[&str])] = &[
    (Location::Kitchen, &["廚房", "kitchen"]),
    (Location::Living, &["客廳", "living"]),
    (Location::Guest, &["客房", "guest"]),
];

static TEMPERATURE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(冷氣|空調|ac|溫度|temp)\D*(\d{2})\D*(度|度數)?",
        r"調\s*(冷氣|空調)\s*[到調]?\s*(\d{2})",
        r"set\s*(ac|air conditioner)\s*to\s*(\d{2})",
        r"冷氣\s*(\d+)\s*度",
        r"set ac (\d+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid temperature regex"))
    .collect()
});

/// Whether `keyword` occurs in `text`.
///
/// ASCII keywords only count at word boundaries, so `conditioner` does not
/// contain `on`. CJK keywords match anywhere.
pub fn contains_keyword(text: &str, keyword: &str) -> bool {
    if !keyword.is_ascii() {
        return text.contains(keyword);
    }
    text.match_indices(keyword).any(|(start, matched)| {
        let end = start + matched.len();
        let before = text[..start].chars().next_back();
        let after = text[end..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphanumeric())
            && !after.is_some_and(|c| c.is_ascii_alphanumeric())
    })
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| contains_keyword(text, k))
}

/// Switch direction named in `text`; `Err(())` when both directions are.
fn polarity(text: &str) -> Result<Option<IntentAction>, ()> {
    match (contains_any(text, ON_WORDS), contains_any(text, OFF_WORDS)) {
        (true, true) => Err(()),
        (true, false) => Ok(Some(IntentAction::TurnOn)),
        (false, true) => Ok(Some(IntentAction::TurnOff)),
        (false, false) => Ok(None),
    }
}

/// A spoken set-point next to an AC or temperature word, if within `range`.
pub fn explicit_temperature(text: &str, range: &RangeInclusive<i32>) -> Option<i32> {
    for pattern in TEMPERATURE_PATTERNS.iter() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        let number = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
            .last();
        if let Some(value) = number.and_then(|s| s.parse::<i32>().ok()) {
            if range.contains(&value) {
                return Some(value);
            }
        }
    }
    None
}

/// Intents found in a normalized utterance, or `None` to defer.
pub fn match_keywords(text: &str, explicit: &RangeInclusive<i32>) -> Option<Vec<CommandIntent>> {
    if NEGATIONS.iter().any(|n| text.contains(n)) {
        debug!(text, "negated command, deferring");
        return None;
    }

    if let Some(value) = explicit_temperature(text, explicit) {
        return Some(vec![CommandIntent::set_temp(value)]);
    }

    let Ok(direction) = polarity(text) else {
        debug!(text, "both on and off keywords present, deferring");
        return None;
    };

    if direction == Some(IntentAction::TurnOff) && contains_any(text, ALL_WORDS) {
        return Some(vec![
            CommandIntent::new(IntentAction::TurnOff, Device::Light),
            CommandIntent::new(IntentAction::TurnOff, Device::Fan),
        ]);
    }

    if let Some(action) = direction {
        let mut intents = Vec::new();
        if contains_any(text, LIGHT_WORDS) {
            let rooms = ROOM_WORDS
                .iter()
                .filter(|(_, words)| contains_any(text, words))
                .map(|(room, _)| *room)
                .collect();
            intents.push(CommandIntent::new(action, Device::Light).in_rooms(rooms));
        }
        if contains_any(text, FAN_WORDS) {
            intents.push(CommandIntent::new(action, Device::Fan));
        }
        if contains_any(text, AC_WORDS) {
            intents.push(CommandIntent::new(action, Device::Ac));
        }
        if !intents.is_empty() {
            return Some(intents);
        }
    }

    if contains_any(text, AC_WORDS) {
        if text.contains("低一點") {
            return Some(vec![CommandIntent::new(IntentAction::LowerTemp, Device::Ac)]);
        }
        if text.contains("高一點") {
            return Some(vec![CommandIntent::new(IntentAction::HigherTemp, Device::Ac)]);
        }
    }

    None
}
