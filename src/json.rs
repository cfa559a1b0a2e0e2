//! Locates JSON values embedded in free-form model text.
//!
//! Models asked to "answer in JSON" routinely wrap the payload in prose or a
//! markdown code fence. The scanner here recovers the outermost bracketed
//! structure from such text without ever being fooled by braces that sit
//! inside string literals.

use serde_json::Value;

/// Attempts to extract and decode the outermost JSON structure found in `text`.
///
/// The scan runs left to right exactly once, tracking a bracket stack, an
/// in-string flag, and an escape-pending flag. The first opener seen while the
/// stack is empty marks the candidate start; the closer that empties the stack
/// marks the end. The inclusive substring is then decoded.
///
/// Returns `None` when no candidate is found, when brackets are mismatched or
/// left unclosed, or when the candidate substring fails to decode.
///
/// # Examples
///
/// ```
/// use musubi::json::extract;
///
/// let value = extract(r#"Sure! Here you go: {"capital":"Pretoria"} Hope that helps."#);
/// assert_eq!(value.unwrap()["capital"], "Pretoria");
///
/// // Braces inside string literals are not structural.
/// assert!(extract(r#"the token "{" is an opener"#).is_none());
/// ```
pub fn extract(text: &str) -> Option<Value> {
    let candidate = find_outermost(text.trim())?;
    serde_json::from_str(candidate).ok()
}

/// Returns the inner content of the first ```` ```json ```` fenced code block.
///
/// Used as the second step of the JSON-mode fallback: when the direct scan
/// finds nothing, providers retry against the fence body before giving up.
pub fn extract_fenced(text: &str) -> Option<&str> {
    let start = text.find("```json")?;
    let inner = &text[start + "```json".len()..];
    let end = inner.find("```")?;
    Some(inner[..end].trim())
}

/// Re-encodes a located value into a canonical JSON string.
///
/// The model's own formatting (indentation, stray whitespace, fencing) is
/// discarded; the caller receives the compact `serde_json` rendering.
pub fn canonical_string(value: &Value) -> String {
    value.to_string()
}

/// Finds the outermost bracketed substring, or `None` when the scan fails.
///
/// Stray closers before any opener are skipped; a closer that does not match
/// the most recent opener aborts the scan; an opener with no closer leaves the
/// stack non-empty and yields `None`.
fn find_outermost(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut stack: Vec<u8> = Vec::new();
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &byte) in bytes.iter().enumerate() {
        if in_string {
            if escape_next {
                escape_next = false;
            } else if byte == b'\\' {
                escape_next = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                if stack.is_empty() {
                    start = Some(i);
                }
                stack.push(byte);
            }
            b'}' | b']' => {
                let Some(opener) = stack.pop() else {
                    continue; // stray closer before any opener
                };
                if (byte == b'}' && opener != b'{') || (byte == b']' && opener != b'[') {
                    return None;
                }
                if stack.is_empty() {
                    return start.map(|s| &text[s..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_object_surrounded_by_prose() {
        let text = r#"The answer is {"capital": "Pretoria"} according to my data."#;
        assert_eq!(extract(text), Some(json!({"capital": "Pretoria"})));
    }

    #[test]
    fn extracts_array_surrounded_by_prose() {
        let text = "counting: [1, 2, 3] done";
        assert_eq!(extract(text), Some(json!([1, 2, 3])));
    }

    #[test]
    fn ignores_braces_inside_string_literals() {
        let text = r#"{"note": "a literal } inside", "n": 1} trailing"#;
        assert_eq!(
            extract(text),
            Some(json!({"note": "a literal } inside", "n": 1}))
        );
    }

    #[test]
    fn quoted_brace_in_prose_is_not_an_opener() {
        // The quote opens a string; the brace inside it must not start a candidate.
        assert_eq!(extract(r#"say "{" and nothing else"#), None);
    }

    #[test]
    fn skips_stray_closer_before_real_opener() {
        let text = r#"} then {"a":1}"#;
        assert_eq!(extract(text), Some(json!({"a": 1})));
    }

    #[test]
    fn mismatched_brackets_fail() {
        assert_eq!(extract(r#"{"a": [1, 2}"#), None);
    }

    #[test]
    fn unclosed_opener_is_not_found() {
        assert_eq!(extract(r#"{"a": 1"#), None);
    }

    #[test]
    fn no_brackets_is_not_found() {
        assert_eq!(extract("just a plain sentence"), None);
        assert_eq!(extract(""), None);
    }

    #[test]
    fn escaped_quote_inside_string_is_inert() {
        let text = r#"{"quote": "she said \"hi\""}"#;
        assert_eq!(extract(text), Some(json!({"quote": "she said \"hi\""})));
    }

    #[test]
    fn first_of_multiple_top_level_values_wins() {
        let text = r#"{"first": true} and later {"second": true}"#;
        assert_eq!(extract(text), Some(json!({"first": true})));
    }

    #[test]
    fn nested_structure_returns_outermost() {
        let text = r#"x {"outer": {"inner": [1]}} y"#;
        assert_eq!(extract(text), Some(json!({"outer": {"inner": [1]}})));
    }

    #[test]
    fn undecodable_candidate_is_not_found() {
        assert_eq!(extract("{not json at all}"), None);
    }

    #[test]
    fn fenced_block_content_is_recovered() {
        let text = "Here:\n```json\n{\"a\": 1}\n```\nthanks";
        assert_eq!(extract_fenced(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn fenced_block_missing_terminator_is_none() {
        assert_eq!(extract_fenced("```json\n{\"a\": 1}"), None);
        assert_eq!(extract_fenced("no fence here"), None);
    }

    #[test]
    fn canonical_round_trip_is_deep_equal() {
        let text = "```json\n{\n  \"a\": [1, 2],\n  \"b\": \"x\"\n}\n```";
        let located = extract(text).expect("fenced body should be located");
        let reencoded = canonical_string(&located);
        let decoded: Value = serde_json::from_str(&reencoded).expect("canonical string decodes");
        assert_eq!(decoded, located);
    }
}
