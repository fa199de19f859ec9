//! JSON sanitization for LLM responses.
//!
//! Three-stage decode: strict parse first, code-fence extraction next,
//! trailing-comma cleanup last. Each stage only runs if the previous one
//! failed to parse.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap());
static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([}\]])").unwrap());

/// Pull a JSON-looking block out of free-form model text: prefer a fenced
/// ```json ... ``` block, else fall back to the span from the first `{` to
/// the last `}`.
pub fn extract_json_block(text: &str) -> Option<&str> {
    if let Some(caps) = CODE_FENCE.captures(text) {
        return caps.get(1).map(|m| m.as_str());
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end >= start {
        Some(&text[start..=end])
    } else {
        None
    }
}

fn strip_trailing_commas(text: &str) -> String {
    TRAILING_COMMA.replace_all(text, "$1").into_owned()
}

/// Strict parse, then code-fence/raw extraction, then trailing-comma
/// cleanup, in that order. Returns the first interpretation that parses.
pub fn decode_structured<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    if let Ok(value) = serde_json::from_str::<T>(raw) {
        return Ok(value);
    }

    let candidate = extract_json_block(raw).unwrap_or(raw);
    if let Ok(value) = serde_json::from_str::<T>(candidate) {
        return Ok(value);
    }

    let sanitized = strip_trailing_commas(candidate);
    serde_json::from_str::<T>(&sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        a: i32,
        b: String,
    }

    #[test]
    fn strict_json_parses_directly() {
        let raw = r#"{"a": 1, "b": "x"}"#;
        let result: Sample = decode_structured(raw).unwrap();
        assert_eq!(result, Sample { a: 1, b: "x".to_string() });
    }

    #[test]
    fn extracts_fenced_code_block() {
        let raw = "Here is the plan:\n```json\n{\"a\": 2, \"b\": \"y\"}\n```\nThanks.";
        let result: Sample = decode_structured(raw).unwrap();
        assert_eq!(result, Sample { a: 2, b: "y".to_string() });
    }

    #[test]
    fn strips_trailing_commas_before_closing_brace() {
        let raw = r#"{"a": 3, "b": "z",}"#;
        let result: Sample = decode_structured(raw).unwrap();
        assert_eq!(result, Sample { a: 3, b: "z".to_string() });
    }

    #[test]
    fn no_json_returns_error() {
        let raw = "no json here";
        let result: Result<Sample, _> = decode_structured(raw);
        assert!(result.is_err());
    }

    #[test]
    fn extract_json_block_prefers_fence_over_raw_braces() {
        let raw = "{\"decoy\": true} ```json\n{\"real\": 1}\n```";
        let block = extract_json_block(raw).unwrap();
        assert!(block.contains("real"));
    }
}
