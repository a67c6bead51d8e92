//! Speech-to-text cleanup.

/// Common misrecognitions and their intended spelling, applied in order.
///
/// The CJK entries are single syllables the recognizer confuses with the
/// device words 燈, 氣, 調, 扇 and 風. The ASCII entries are English
/// near-homophones of `light`, `fan` and `ac`.
const HOMOPHONES: &[(&str, &str)] = &[
    ("當", "燈"),
    ("鄧", "燈"),
    ("登", "燈"),
    ("堂", "燈"),
    ("黨", "燈"),
    ("起", "氣"),
    ("七", "氣"),
    ("期", "氣"),
    ("汽", "氣"),
    ("掉", "調"),
    ("到", "調"),
    ("山", "扇"),
    ("三", "扇"),
    ("善", "扇"),
    ("豐", "風"),
    ("like", "light"),
    ("right", "light"),
    ("van", "fan"),
    ("fun", "fan"),
    ("a c", "ac"),
    ("ace", "ac"),
    ("as", "ac"),
];

/// Trim, lower-case, then apply the homophone table.
pub fn normalize(text: &str) -> String {
    let mut out = text.trim().to_lowercase();
    for (heard, meant) in HOMOPHONES {
        if out.contains(heard) {
            out = out.replace(heard, meant);
        }
    }
    out
}
