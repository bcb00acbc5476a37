//! Recovering a query document from raw model text.
//!
//! Models wrap JSON in markdown fences or chat around it. The parser strips a
//! leading fence, tries a strict parse, then falls back to the outermost
//! `{ ... }` slice. Nothing in the text is evaluated.

use super::document::QueryDocument;
use crate::core::error::QueryError;
use serde_json::{Map, Value};

const FENCE: &str = "```";

/// Parse the model's raw completion into a [`QueryDocument`].
///
/// Fails with [`QueryError::MalformedOutput`] (carrying `raw`) when no JSON
/// object can be recovered.
pub fn parse_query_document(raw: &str) -> Result<QueryDocument, QueryError> {
    let cleaned = strip_code_fence(raw);
    if cleaned.is_empty() {
        return Err(QueryError::malformed(raw, "model returned empty output"));
    }

    let primary = match parse_object(cleaned) {
        Ok(map) => return Ok(QueryDocument::new(map)),
        Err(e) => e,
    };

    if let Some(slice) = outermost_braces(cleaned)
        && let Ok(map) = parse_object(slice)
    {
        return Ok(QueryDocument::new(map));
    }

    Err(QueryError::malformed(raw, primary))
}

/// Trim, and if the text opens with a code fence remove the opening fence
/// line and everything from the last closing fence onward.
pub fn strip_code_fence(raw: &str) -> &str {
    let cleaned = raw.trim();
    let Some(after_open) = cleaned.strip_prefix(FENCE) else {
        return cleaned;
    };

    let body = match cleaned.find('\n') {
        Some(newline) => &cleaned[newline + 1..],
        None => after_open,
    };

    let body = match body.rfind(FENCE) {
        Some(close) => &body[..close],
        None => body,
    };

    body.trim()
}

fn parse_object(text: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, found {}", json_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn outermost_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
