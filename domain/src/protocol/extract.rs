//! Tolerant JSON extraction from raw LLM output.
//!
//! Models are instructed to answer with a single-line JSON object, but real
//! output arrives wrapped in code fences, preceded by chatter, with literal
//! newlines inside string values, or cut off mid-object at the token limit.
//! This module recovers a parseable object from all of those shapes; what it
//! cannot recover becomes a [`JsonExtractError`] for the normalizer's
//! deterministic fallback path.

use serde_json::Value;
use thiserror::Error;

/// Extraction failed; the message describes the first unrecoverable problem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct JsonExtractError(pub String);

/// Extract a JSON object from raw model output.
///
/// Pipeline: prefer the contents of the first fenced code block, locate the
/// first balanced `{...}` object (brace scanning is string-aware), escape
/// literal newlines inside string values, and, for output truncated
/// mid-object, append the missing close quote and braces before parsing.
///
/// # Example
///
/// ```
/// use council_domain::protocol::extract_json;
///
/// let raw = "Sure! Here is my answer:\n```json\n{\"action\": \"PASS\", \"reason\": \"ok\"}\n```";
/// let value = extract_json(raw).unwrap();
/// assert_eq!(value["action"], "PASS");
/// ```
pub fn extract_json(raw: &str) -> Result<Value, JsonExtractError> {
    let candidate = strip_code_fence(raw);

    // Chatter ahead of the object may itself contain braces; try each
    // opening brace as a candidate start until one yields a parse.
    let mut first_error: Option<String> = None;
    let mut from = 0usize;

    while let Some(offset) = candidate[from..].find('{') {
        let start = from + offset;
        let scan = scan_object(&candidate[start..]);
        let sanitized = escape_raw_newlines(&scan.text);

        match serde_json::from_str(&sanitized) {
            Ok(value) => return Ok(value),
            Err(parse_err) => {
                if !scan.complete {
                    // Truncated at end of output: close the open string and
                    // the open braces.
                    let mut repaired = sanitized;
                    if scan.in_string {
                        repaired.push('"');
                    }
                    for _ in 0..scan.depth {
                        repaired.push('}');
                    }
                    if let Ok(value) = serde_json::from_str(&repaired) {
                        return Ok(value);
                    }
                }
                first_error.get_or_insert(parse_err.to_string());
            }
        }
        from = start + 1;
    }

    Err(JsonExtractError(match first_error {
        Some(message) => message,
        None => format!("no JSON object found in response ({} chars)", raw.len()),
    }))
}

/// If the text contains a fenced code block, return its contents; otherwise
/// the input unchanged. An unterminated fence yields everything after the
/// opening fence (the body may still be a repairable truncated object).
fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after_fence = &text[open + 3..];
    // Skip the optional language tag on the fence line.
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    }
}

struct ObjectScan {
    text: String,
    complete: bool,
    depth: usize,
    in_string: bool,
}

/// Scan a `{...}` object starting at the first byte of `text` (which must
/// begin at an opening brace). String-aware: braces inside string literals
/// do not count, and escape sequences are honored.
fn scan_object(text: &str) -> ObjectScan {
    let start = 0;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return ObjectScan {
                        text: text[start..end].to_string(),
                        complete: true,
                        depth: 0,
                        in_string: false,
                    };
                }
            }
            _ => {}
        }
    }

    ObjectScan {
        text: text[start..].trim_end().to_string(),
        complete: false,
        depth,
        in_string,
    }
}

/// Replace literal newlines inside string values with the `\n` escape.
/// Carriage returns inside strings are dropped.
fn escape_raw_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if escaped {
            escaped = false;
            out.push(ch);
            continue;
        }
        match ch {
            '\\' if in_string => {
                escaped = true;
                out.push(ch);
            }
            '"' => {
                in_string = !in_string;
                out.push(ch);
            }
            '\n' if in_string => out.push_str("\\n"),
            '\r' if in_string => {}
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object() {
        let value = extract_json(r#"{"action": "PASS", "reason": "done"}"#).unwrap();
        assert_eq!(value["action"], "PASS");
    }

    #[test]
    fn test_fenced_with_language_tag() {
        let raw = "```json\n{\"second\": true, \"rationale\": \"agreed\"}\n```";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["second"], true);
    }

    #[test]
    fn test_surrounding_chatter() {
        let raw = "Of course — here's my vote: {\"ballot\": \"YES\", \"rationale\": \"sound\"} hope that helps!";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["ballot"], "YES");
    }

    #[test]
    fn test_braces_inside_strings_ignored() {
        let raw = r#"{"message": "use {braces} carefully", "action": "CONTRIBUTE"}"#;
        let value = extract_json(raw).unwrap();
        assert_eq!(value["message"], "use {braces} carefully");
    }

    #[test]
    fn test_raw_newline_inside_string() {
        let raw = "{\"message\": \"first line\nsecond line\", \"action\": \"CONTRIBUTE\"}";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["message"], "first line\nsecond line");
    }

    #[test]
    fn test_truncated_object_repaired() {
        let raw = r#"{"ballot": "YES", "rationale": "this got cut of"#;
        let value = extract_json(raw).unwrap();
        assert_eq!(value["ballot"], "YES");
        assert_eq!(value["rationale"], "this got cut of");
    }

    #[test]
    fn test_truncated_nested_object_repaired() {
        let raw = r#"{"outer": {"inner": "value"#;
        let value = extract_json(raw).unwrap();
        assert_eq!(value["outer"]["inner"], "value");
    }

    #[test]
    fn test_no_object_is_error() {
        let err = extract_json("lol not json").unwrap_err();
        assert!(err.0.contains("no JSON object"));
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let raw = r#"{"message": "she said \"yes\"", "action": "CONTRIBUTE"}"#;
        let value = extract_json(raw).unwrap();
        assert_eq!(value["message"], r#"she said "yes""#);
    }

    #[test]
    fn test_unterminated_fence_still_extracts() {
        let raw = "```json\n{\"second\": false, \"rationale\": \"no\"}";
        let value = extract_json(raw).unwrap();
        assert_eq!(value["second"], false);
    }
}
