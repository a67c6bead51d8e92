//! Prompt construction.

use crate::validator::TemperatureBounds;

/// Everything the prompt needs besides the command itself.
#[derive(Clone, Debug, PartialEq)]
pub struct PromptContext {
    pub safety: TemperatureBounds,
    pub comfort: TemperatureBounds,
    pub setpoint: i32,
    /// Rule file contents, already trimmed to budget
    pub memory: String,
    /// Formatted recent history, already trimmed to budget
    pub history: String,
}

/// The last `max` characters of `text`. Counts characters, not bytes.
pub fn tail_chars(text: &str, max: usize) -> &str {
    let count = text.chars().count();
    if count <= max {
        return text;
    }
    match text.char_indices().nth(count - max) {
        Some((start, _)) => &text[start..],
        None => "",
    }
}

fn or_empty(text: &str) -> &str {
    if text.trim().is_empty() {
        "(empty)"
    } else {
        text
    }
}

/// Render the full request for `command` (already rule-rewritten).
pub fn build_prompt(ctx: &PromptContext, command: &str) -> String {
    format!(
        "You are a smart-home command parser.
You must output JSON ONLY.

OUTPUT FORMAT (hard constraints):
- Output must be exactly a single JSON array.
- Each element is an action object with:
  - type: one of [\"SET_TEMP\",\"FAN\",\"LED\"]
  - For SET_TEMP: value (number)
  - For FAN: state (\"on\"|\"off\"), optional duration (seconds integer)
  - For LED: location (\"KITCHEN\"|\"LIVING\"|\"GUEST\"), state (\"on\"|\"off\"), optional duration (seconds integer)

DEVICE MAPPING:
- Kitchen light => LED location \"KITCHEN\"
- Living room light => LED location \"LIVING\"
- Guest room light => LED location \"GUEST\"
- Fan => type \"FAN\"
- Temperature => type \"SET_TEMP\" (Celsius)

SYSTEM RULES:
- Temperature unit is Celsius.
- Absolute safety range: {safe_min:.1} to {safe_max:.1} inclusive.
  If asked outside, clamp into range.
- Comfort range: {comfort_min:.1} to {comfort_max:.1}.
- Ignore profanity and filler words; parse only the intent.
- If the user mentions multiple devices, output multiple actions.
- If the command is unrelated, output [].

TEMPERATURE INTERPRETATION:
1) If the user gives a number, use it (then clamp).
2) If the user is vague (e.g. \"comfortable\"), pick a number in the comfort range.
3) If the user is relative without a number:
   - Start from the current setting {setpoint}.
   - Typical adjustments:
     * \"cold\" => +2
     * \"hot\" => -2
     * \"higher a bit\" => +1
     * \"lower a bit\" => -1
   - Apply memory rules if they define custom meanings.
   - Then clamp.

CONTEXT:
- Current temperature setting is {setpoint} °C.
- Memory rules (user preferences) to apply:
{memory}

- Recent conversation history (most recent last):
{history}

USER COMMAND:
{command}

Now output JSON only.",
        safe_min = ctx.safety.min,
        safe_max = ctx.safety.max,
        comfort_min = ctx.comfort.min,
        comfort_max = ctx.comfort.max,
        setpoint = ctx.setpoint,
        memory = or_empty(&ctx.memory),
        history = or_empty(&ctx.history),
        command = command.trim(),
    )
}
