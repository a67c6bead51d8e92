//! Exact-phrase table.
//!
//! Short utterances the recognizer produces for the common commands,
//! including its usual misspellings. Keys are normalized when the table is
//! built, so a misspelled key and its corrected form land on the same entry.

use super::intent::{CommandIntent, Device, IntentAction};
use super::normalize::normalize;
use once_cell::sync::Lazy;
use std::collections::HashMap;

use Device::{Ac, Fan, Light};
use IntentAction::{HigherTemp, LowerTemp, SetTemp, TurnOff, TurnOn};

#[rustfmt::skip]
const PHRASES: &[(&str, IntentAction, Device, Option<i32>)] = &[
    ("開燈", TurnOn, Light, None),
    ("關燈", TurnOff, Light, None),
    ("打開燈", TurnOn, Light, None),
    ("關掉燈", TurnOff, Light, None),
    ("燈開", TurnOn, Light, None),
    ("燈關", TurnOff, Light, None),
    ("開當", TurnOn, Light, None),
    ("開鄧", TurnOn, Light, None),
    ("開登", TurnOn, Light, None),
    ("開堂", TurnOn, Light, None),
    ("開黨", TurnOn, Light, None),
    ("開燈嗎", TurnOn, Light, None),
    ("開燈啦", TurnOn, Light, None),
    ("關當", TurnOff, Light, None),
    ("關鄧", TurnOff, Light, None),
    ("關登", TurnOff, Light, None),
    ("關堂", TurnOff, Light, None),
    ("關黨", TurnOff, Light, None),
    ("關燈啊", TurnOff, Light, None),
    ("turn on light", TurnOn, Light, None),
    ("turn off light", TurnOff, Light, None),
    ("light on", TurnOn, Light, None),
    ("light off", TurnOff, Light, None),
    ("turn on like", TurnOn, Light, None),
    ("turn off like", TurnOff, Light, None),
    ("turn on right", TurnOn, Light, None),
    ("turn off right", TurnOff, Light, None),
    ("lights on", TurnOn, Light, None),
    ("lights off", TurnOff, Light, None),
    ("開風扇", TurnOn, Fan, None),
    ("關風扇", TurnOff, Fan, None),
    ("開電扇", TurnOn, Fan, None),
    ("關電扇", TurnOff, Fan, None),
    ("開店扇", TurnOn, Fan, None),
    ("開電山", TurnOn, Fan, None),
    ("開電三", TurnOn, Fan, None),
    ("開電善", TurnOn, Fan, None),
    ("開電扇嗎", TurnOn, Fan, None),
    ("關電山", TurnOff, Fan, None),
    ("關電三", TurnOff, Fan, None),
    ("關電善", TurnOff, Fan, None),
    ("關店扇", TurnOff, Fan, None),
    ("開電風扇", TurnOn, Fan, None),
    ("關電風扇", TurnOff, Fan, None),
    ("開電風山", TurnOn, Fan, None),
    ("開電豐扇", TurnOn, Fan, None),
    ("開電風三", TurnOn, Fan, None),
    ("開電風善", TurnOn, Fan, None),
    ("開電風扇啊", TurnOn, Fan, None),
    ("關電風山", TurnOff, Fan, None),
    ("關電豐扇", TurnOff, Fan, None),
    ("關電風三", TurnOff, Fan, None),
    ("關電風善", TurnOff, Fan, None),
    ("關電風扇吧", TurnOff, Fan, None),
    ("fan on", TurnOn, Fan, None),
    ("fan off", TurnOff, Fan, None),
    ("turn on fan", TurnOn, Fan, None),
    ("turn off fan", TurnOff, Fan, None),
    ("turn on fans", TurnOn, Fan, None),
    ("turn off fans", TurnOff, Fan, None),
    ("van on", TurnOn, Fan, None),
    ("van off", TurnOff, Fan, None),
    ("fun on", TurnOn, Fan, None),
    ("fun off", TurnOff, Fan, None),
    ("開冷氣", TurnOn, Ac, None),
    ("關冷氣", TurnOff, Ac, None),
    ("開空調", TurnOn, Ac, None),
    ("關空調", TurnOff, Ac, None),
    ("開冷起", TurnOn, Ac, None),
    ("開冷七", TurnOn, Ac, None),
    ("開冷期", TurnOn, Ac, None),
    ("開冷汽", TurnOn, Ac, None),
    ("開冷氣嗎", TurnOn, Ac, None),
    ("關冷起", TurnOff, Ac, None),
    ("關冷七", TurnOff, Ac, None),
    ("關冷期", TurnOff, Ac, None),
    ("關冷汽", TurnOff, Ac, None),
    ("關冷氣啊", TurnOff, Ac, None),
    ("開空掉", TurnOn, Ac, None),
    ("開空調嗎", TurnOn, Ac, None),
    ("開空調啊", TurnOn, Ac, None),
    ("關空掉", TurnOff, Ac, None),
    ("關空調吧", TurnOff, Ac, None),
    ("關空調啊", TurnOff, Ac, None),
    ("ac on", TurnOn, Ac, None),
    ("ac off", TurnOff, Ac, None),
    ("turn on ac", TurnOn, Ac, None),
    ("turn off ac", TurnOff, Ac, None),
    ("a c on", TurnOn, Ac, None),
    ("ace on", TurnOn, Ac, None),
    ("as on", TurnOn, Ac, None),
    ("a c off", TurnOff, Ac, None),
    ("ace off", TurnOff, Ac, None),
    ("as off", TurnOff, Ac, None),
    ("冷氣 25 度", SetTemp, Ac, Some(25)),
    ("冷氣 26 度", SetTemp, Ac, Some(26)),
    ("冷氣 24 度", SetTemp, Ac, Some(24)),
    ("冷氣 27 度", SetTemp, Ac, Some(27)),
    ("冷氣調 25 度", SetTemp, Ac, Some(25)),
    ("調冷氣 25 度", SetTemp, Ac, Some(25)),
    ("冷氣 25", SetTemp, Ac, Some(25)),
    ("冷起 25 度", SetTemp, Ac, Some(25)),
    ("冷氣調 2 5 度", SetTemp, Ac, Some(25)),
    ("調冷氣 2 5 度", SetTemp, Ac, Some(25)),
    ("冷氣調 25 渡", SetTemp, Ac, Some(25)),
    ("冷氣調 25 都", SetTemp, Ac, Some(25)),
    ("把冷氣調到 25 度", SetTemp, Ac, Some(25)),
    ("把冷起調到 25 度", SetTemp, Ac, Some(25)),
    ("把冷氣調到 25 渡", SetTemp, Ac, Some(25)),
    ("把冷氣調到 25 都啊", SetTemp, Ac, Some(25)),
    ("冷氣低一點", LowerTemp, Ac, None),
    ("冷氣高一點", HigherTemp, Ac, None),
    ("set ac 25", SetTemp, Ac, Some(25)),
    ("set ac 26", SetTemp, Ac, Some(26)),
    ("set a c to 25", SetTemp, Ac, Some(25)),
    ("set ace to 25", SetTemp, Ac, Some(25)),
    ("set as to 25", SetTemp, Ac, Some(25)),
    ("ac 25 degrees", SetTemp, Ac, Some(25)),
    ("a c 25 degrees", SetTemp, Ac, Some(25)),
    ("ace 25 degrees", SetTemp, Ac, Some(25)),
    ("set air conditioner to 25", SetTemp, Ac, Some(25)),
    ("set air conditioner to 2 5", SetTemp, Ac, Some(25)),
    ("lower ac", LowerTemp, Ac, None),
    ("lower a c", LowerTemp, Ac, None),
    ("lower ace", LowerTemp, Ac, None),];

static EXACT: Lazy<HashMap<String, CommandIntent>> = Lazy::new(|| {
    let mut table = HashMap::with_capacity(PHRASES.len());
    for &(phrase, action, device, value) in PHRASES {
        table
            .entry(normalize(phrase))
            .or_insert(CommandIntent {
                action,
                device,
                value,
                rooms: Vec::new(),
            });
    }
    table
});

/// Intent for an already-normalized utterance, if it is a known phrase.
pub fn lookup(normalized: &str) -> Option<&'static CommandIntent> {
    EXACT.get(normalized)
}

/// Number of distinct normalized phrases.
#[cfg(test)]
fn phrase_count() -> usize {
    EXACT.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misspelled_keys_share_an_entry() {
        let intent = lookup(&normalize("開黨")).unwrap();
        assert_eq!(intent, lookup("開燈").unwrap());
        assert_eq!(intent.action, TurnOn);
        assert_eq!(intent.device, Light);
    }

    #[test]
    fn temperature_phrases_carry_values() {
        let intent = lookup(&normalize("把冷氣調到 25 度")).unwrap();
        assert_eq!(intent.action, SetTemp);
        assert_eq!(intent.value, Some(25));
        assert_eq!(lookup(&normalize("set ac 26")).unwrap().value, Some(26));
    }

    #[test]
    fn english_phrases() {
        assert_eq!(lookup(&normalize("Fun Off")).unwrap().device, Fan);
        assert_eq!(lookup(&normalize("lower a c")).unwrap().action, LowerTemp);
        assert_eq!(lookup(&normalize("冷氣高一點")).unwrap().action, HigherTemp);
        assert_eq!(lookup(&normalize("as off")).unwrap().action, TurnOff);
    }

    #[test]
    fn normalization_merges_duplicates() {
        assert!(phrase_count() < PHRASES.len());
        assert!(phrase_count() > 50);
    }

    #[test]
    fn unknown_phrase_misses() {
        assert!(lookup("開窗").is_none());
    }
}
