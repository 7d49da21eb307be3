//! Repair of near-valid JSON emitted by the model
//!
//! Models occasionally wrap JSON in Markdown fences or embed raw newlines
//! and stray control bytes inside string values, which is syntactically
//! invalid JSON but recoverable by conservative rewriting. Each stage is
//! attempted only if the previous one fails to parse; the final failure
//! carries the last underlying parser message.

use thiserror::Error;

/// The model output could not be parsed as JSON by any repair stage
#[derive(Debug, Error)]
#[error("unable to parse model output as JSON: {message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    /// The last underlying parser error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Parse model output into an untyped JSON value through staged repair
///
/// 1. Strip Markdown code fences, parse directly.
/// 2. Escape literal newlines/tabs/carriage-returns inside quoted string
///    values and drop other in-string control bytes, parse again.
/// 3. Replace every control character with a space, collapse repeated
///    whitespace, parse one last time.
pub fn parse(raw: &str) -> Result<serde_json::Value, ParseError> {
    let stripped = strip_code_fences(raw);

    if let Ok(value) = serde_json::from_str(&stripped) {
        return Ok(value);
    }

    let escaped = escape_control_in_strings(&stripped);
    if let Ok(value) = serde_json::from_str(&escaped) {
        return Ok(value);
    }

    let scrubbed = scrub_control_characters(&stripped);
    serde_json::from_str(&scrubbed).map_err(|err| ParseError {
        message: err.to_string(),
    })
}

/// Remove leading/trailing Markdown code-fence markers (``` or ```json)
fn strip_code_fences(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        text = rest.trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }

    text.to_string()
}

/// Escape raw control characters that occur inside quoted string values
///
/// A value is delimited by the nearest unescaped quotes. Literal newlines,
/// tabs, and carriage returns become their escaped forms; any other
/// control character is dropped. Outside strings, control characters that
/// are not valid JSON whitespace are dropped as well.
fn escape_control_in_strings(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in input.chars() {
        if in_string {
            if escaped {
                out.push(c);
                escaped = false;
                continue;
            }
            match c {
                '\\' => {
                    out.push(c);
                    escaped = true;
                }
                '"' => {
                    out.push(c);
                    in_string = false;
                }
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                '\r' => out.push_str("\\r"),
                c if (c as u32) < 0x20 => {}
                c => out.push(c),
            }
        } else {
            match c {
                '"' => {
                    out.push(c);
                    in_string = true;
                }
                '\n' | '\t' | '\r' => out.push(c),
                c if (c as u32) < 0x20 => {}
                c => out.push(c),
            }
        }
    }

    out
}

/// Replace every control character (0x00-0x1F, 0x7F) with a space and
/// collapse runs of whitespace
fn scrub_control_characters(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous_was_space = false;

    for c in input.chars() {
        let c = if (c as u32) < 0x20 || (c as u32) == 0x7F {
            ' '
        } else {
            c
        };
        if c == ' ' {
            if !previous_was_space {
                out.push(c);
            }
            previous_was_space = true;
        } else {
            out.push(c);
            previous_was_space = false;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json_passes_through() {
        let value = parse(r#"{"a": 1}"#).expect("should parse");
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_fenced_json_is_unwrapped() {
        let value = parse("```json\n{\"a\":1}\n```").expect("should parse");
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_bare_fence_is_unwrapped() {
        let value = parse("```\n{\"a\":1}\n```").expect("should parse");
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_raw_newline_inside_string_recovered() {
        // A literal newline inside a string value is invalid JSON but the
        // second stage escapes it without touching the surrounding document
        let raw = "{\"summary\": \"first line\nsecond line\", \"ok\": true}";
        let value = parse(raw).expect("should recover");
        assert_eq!(value["summary"], json!("first line\nsecond line"));
        assert_eq!(value["ok"], json!(true));
    }

    #[test]
    fn test_raw_tab_inside_string_recovered() {
        let raw = "{\"text\": \"a\tb\"}";
        let value = parse(raw).expect("should recover");
        assert_eq!(value["text"], json!("a\tb"));
    }

    #[test]
    fn test_escaped_quote_inside_string_does_not_end_it() {
        let raw = "{\"text\": \"she said \\\"hi\\\"\nbye\"}";
        let value = parse(raw).expect("should recover");
        assert_eq!(value["text"], json!("she said \"hi\"\nbye"));
    }

    #[test]
    fn test_stray_control_byte_scrubbed() {
        // 0x01 inside a string is dropped by stage 2
        let raw = "{\"text\": \"ab\u{0001}cd\"}";
        let value = parse(raw).expect("should recover");
        assert_eq!(value["text"], json!("abcd"));
    }

    #[test]
    fn test_hopeless_input_fails_with_last_error() {
        let err = parse("this is not json at all").unwrap_err();
        assert!(!err.message().is_empty());
    }

    #[test]
    fn test_fence_with_surrounding_whitespace() {
        let value = parse("  ```json\n{\"a\": [1, 2]}\n```  ").expect("should parse");
        assert_eq!(value, json!({"a": [1, 2]}));
    }
}
