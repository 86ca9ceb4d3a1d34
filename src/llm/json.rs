//! Tolerant parsing of structured model output.
//!
//! Models wrap JSON in prose or Markdown fences, or get it slightly wrong.
//! Filters must not fail on that, so this parser never errors: anything it
//! cannot read comes back as an empty object and the caller applies its
//! documented default.

use serde_json::{Map, Value as Json};
use tracing::warn;

/// Parse the first JSON object found in `text`.
///
/// Returns an empty map (and logs a warning) when no object can be parsed.
pub fn load_as_json(text: &str) -> Map<String, Json> {
    let stripped = strip_fences(text.trim());

    if let Ok(Json::Object(map)) = serde_json::from_str::<Json>(stripped) {
        return map;
    }

    if let Some(map) = first_object(stripped) {
        return map;
    }

    warn!(output = %truncate(text, 200), "malformed structured output, using defaults");
    Map::new()
}

/// Drop a surrounding ```json ... ``` fence.
fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the info string ("json", "JSON", ...) up to the first newline.
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// The first `{` from which a complete JSON object parses. Trailing prose
/// after the object is ignored.
fn first_object(text: &str) -> Option<Map<String, Json>> {
    text.match_indices('{').find_map(|(start, _)| {
        match serde_json::Deserializer::from_str(&text[start..]).into_iter::<Json>().next() {
            Some(Ok(Json::Object(map))) => Some(map),
            _ => None,
        }
    })
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_plain_object() {
        let m = load_as_json(r#"{"score": 8.5}"#);
        assert_eq!(m.get("score"), Some(&json!(8.5)));
    }

    #[test]
    fn test_parses_fenced_object() {
        let m = load_as_json("```json\n{\"verdict\": \"No\"}\n```");
        assert_eq!(m.get("verdict"), Some(&json!("No")));
    }

    #[test]
    fn test_parses_object_embedded_in_prose() {
        let m = load_as_json(r#"Sure! Here it is: {"reason": "has {braces}", "score": 3} hope that helps"#);
        assert_eq!(m.get("score"), Some(&json!(3)));
        assert_eq!(m.get("reason"), Some(&json!("has {braces}")));
    }

    #[test]
    fn test_skips_brace_prose_before_object() {
        let m = load_as_json(r#"Criteria {clarity, depth}. Result: {"score": 9}"#);
        assert_eq!(m.get("score"), Some(&json!(9)));

        let m = load_as_json(r#"{oops} {"verdict": "No"} {"verdict": "Yes"}"#);
        assert_eq!(m.get("verdict"), Some(&json!("No")));
    }

    #[test]
    fn test_garbage_yields_empty_map() {
        assert!(load_as_json("I cannot answer that.").is_empty());
        assert!(load_as_json("{ unterminated").is_empty());
        assert!(load_as_json("").is_empty());
        assert!(load_as_json("[1, 2, 3]").is_empty());
    }
}
