//! Reply parsing. Fail-closed: anything unexpected yields no candidates.

use crate::action::RawAction;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

static OPEN_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^```(?:json)?\s*").expect("valid opening fence regex"));
static CLOSE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*```$").expect("valid closing fence regex"));

/// Remove a surrounding Markdown code fence, with or without a `json` tag.
pub fn strip_code_fences(reply: &str) -> String {
    let text = reply.trim();
    let text = OPEN_FENCE.replace(text, "");
    let text = CLOSE_FENCE.replace(&text, "");
    text.trim().to_string()
}

/// Candidate objects from a model reply.
///
/// The reply must be a single JSON array after fence stripping. Elements
/// that are not objects are dropped.
pub fn parse_reply(reply: &str) -> Vec<RawAction> {
    let body = strip_code_fences(reply);
    let value: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "model reply is not JSON");
            return Vec::new();
        }
    };
    match value {
        Value::Array(items) => items.into_iter().filter_map(RawAction::from_value).collect(),
        other => {
            debug!(kind = json_kind(&other), "model reply is not an array");
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_fences("```json\n[]\n```"), "[]");
        assert_eq!(strip_code_fences("```JSON [1]```"), "[1]");
        assert_eq!(strip_code_fences("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fences("  [] "), "[]");
    }

    #[test]
    fn keeps_only_objects() {
        let raws = parse_reply(r#"```json
[{"type":"FAN","state":"on"}, "LED", 3, {"type":"LED"}]
```"#);
        assert_eq!(raws.len(), 2);
        assert_eq!(raws[0].kind(), "FAN");
    }

    #[test]
    fn fails_closed() {
        assert!(parse_reply("Sure! Turning on the fan.").is_empty());
        assert!(parse_reply(r#"{"type":"FAN","state":"on"}"#).is_empty());
        assert!(parse_reply("").is_empty());
        assert!(parse_reply("[]").is_empty());
    }
}
