//! Step output normalization
//!
//! Model output is not guaranteed to be clean JSON: it often arrives inside
//! a fenced code block or with prose around it. The parser absorbs all of
//! that and never fails; whether an empty result counts as a stage failure
//! is the calling step's decision.

use serde_json::Value;

/// Normalizes raw step output into a JSON mapping
///
/// Structured mappings pass through unchanged. Strings go through
/// [`salvage_json`]. Anything else yields an empty mapping.
pub fn parse_step_output(raw: &Value) -> Value {
    match raw {
        Value::Object(_) => raw.clone(),
        Value::String(text) => salvage_json(text),
        _ => {
            tracing::warn!("Step output was neither mapping nor text: {}", raw);
            Value::Object(serde_json::Map::new())
        }
    }
}

/// Extracts a JSON mapping from free-form model text
///
/// Order of attempts: fenced code block (a ```json fence wins over a bare
/// one), strict parse of the whole text, then the substring from the first
/// `{` to the last `}`. On total failure returns `{}` and logs a prefix of
/// the raw text for diagnosis.
pub fn salvage_json(text: &str) -> Value {
    let candidate = extract_fenced_block(text).unwrap_or(text).trim();

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(candidate) {
        return value;
    }

    if let (Some(start), Some(end)) = (candidate.find('{'), candidate.rfind('}')) {
        if start < end {
            if let Ok(value @ Value::Object(_)) =
                serde_json::from_str::<Value>(&candidate[start..=end])
            {
                return value;
            }
        }
    }

    let prefix: String = text.chars().take(200).collect();
    tracing::error!("Failed to parse step output as JSON: {}", prefix);
    Value::Object(serde_json::Map::new())
}

/// Returns the content of the first fenced code block, preferring a block
/// explicitly tagged `json` when both kinds are present
fn extract_fenced_block(text: &str) -> Option<&str> {
    if let Some(open) = text.find("```json") {
        let rest = &text[open + 7..];
        if let Some(close) = rest.find("```") {
            return Some(&rest[..close]);
        }
    }

    if let Some(open) = text.find("```") {
        let rest = &text[open + 3..];
        // skip a language tag on the opening line
        let body_start = rest.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &rest[body_start..];
        if let Some(close) = body.find("```") {
            return Some(&body[..close]);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_json_block() {
        let raw = Value::String("```json\n{\"a\":1}\n```".to_string());
        assert_eq!(parse_step_output(&raw), json!({"a": 1}));
    }

    #[test]
    fn test_bare_json() {
        let raw = Value::String("{\"a\":1}".to_string());
        assert_eq!(parse_step_output(&raw), json!({"a": 1}));
    }

    #[test]
    fn test_garbage_yields_empty_mapping() {
        let raw = Value::String("not json at all".to_string());
        assert_eq!(parse_step_output(&raw), json!({}));
    }

    #[test]
    fn test_mapping_passes_through() {
        let raw = json!({"x": [1, 2, 3]});
        assert_eq!(parse_step_output(&raw), raw);
    }

    #[test]
    fn test_untagged_fence_with_language_line() {
        let raw = Value::String("Here you go:\n```\n{\"b\": true}\n```\nDone.".to_string());
        assert_eq!(parse_step_output(&raw), json!({"b": true}));
    }

    #[test]
    fn test_json_fence_preferred_over_plain_fence() {
        let raw = Value::String(
            "```\nnot it\n```\nsome prose\n```json\n{\"chosen\": 1}\n```".to_string(),
        );
        assert_eq!(parse_step_output(&raw), json!({"chosen": 1}));
    }

    #[test]
    fn test_brace_salvage_from_surrounding_prose() {
        let raw = Value::String("The answer is {\"score\": 0.8} hope that helps!".to_string());
        assert_eq!(parse_step_output(&raw), json!({"score": 0.8}));
    }

    #[test]
    fn test_non_object_json_is_rejected() {
        // a bare array is not a section mapping
        let raw = Value::String("[1, 2, 3]".to_string());
        assert_eq!(parse_step_output(&raw), json!({}));
    }

    #[test]
    fn test_numbers_and_null_yield_empty_mapping() {
        assert_eq!(parse_step_output(&json!(42)), json!({}));
        assert_eq!(parse_step_output(&Value::Null), json!({}));
    }
}
