use crate::domain::model::PlaygroundDetails;
use crate::utils::error::{EnrichError, Result};
use regex::Regex;
use std::sync::OnceLock;

fn json_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?is)```json\b[ \t]*\r?\n(.*?)```").expect("fence pattern is valid")
    })
}

/// Locate the JSON text inside a model answer.
///
/// A ```` ```json ```` fenced block wins; otherwise the first balanced
/// top-level `{...}` object in the text is returned.
pub fn extract_json_text(content: &str) -> Option<&str> {
    if let Some(caps) = json_fence().captures(content) {
        let inner = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        if !inner.is_empty() {
            return Some(inner);
        }
    }

    find_balanced_object(content)
}

/// Scan for the first `{...}` whose braces balance, skipping braces that
/// appear inside string literals.
fn find_balanced_object(content: &str) -> Option<&str> {
    let mut search_from = 0;

    while let Some(offset) = content[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = balanced_end(&content[start..]) {
            return Some(&content[start..start + end]);
        }
        // 這個 '{' 沒有對應的 '}'，改從下一個位置繼續找
        search_from = start + 1;
    }

    None
}

/// Byte length of the object starting at `text[0] == '{'`, if it closes.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

/// Extract and parse the four playground fields from a model answer.
///
/// When the fenced block does not hold a valid object, the first balanced
/// `{...}` in the whole answer is tried before giving up.
pub fn parse_details(content: &str) -> Result<PlaygroundDetails> {
    let json_text = extract_json_text(content).ok_or_else(|| EnrichError::ParseError {
        message: "no JSON object found in the model answer".to_string(),
    })?;

    match parse_object(json_text) {
        Ok(details) => Ok(details),
        Err(first_err) => match find_balanced_object(content) {
            Some(fallback) if fallback != json_text => parse_object(fallback),
            _ => Err(first_err),
        },
    }
}

fn parse_object(json_text: &str) -> Result<PlaygroundDetails> {
    let value: serde_json::Value =
        serde_json::from_str(json_text).map_err(|e| EnrichError::ParseError {
            message: format!("invalid JSON in the model answer: {}", e),
        })?;

    if !value.is_object() {
        return Err(EnrichError::ParseError {
            message: "model answer is not a JSON object".to_string(),
        });
    }

    serde_json::from_value(value).map_err(|e| EnrichError::ParseError {
        message: format!("unexpected fields in the model answer: {}", e),
    })
}
