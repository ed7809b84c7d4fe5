//! Recovers a JSON object from free-form model output.
//!
//! Models sometimes wrap JSON in Markdown fences despite instructions. Fence
//! stripping is the only repair attempted; anything else is `MalformedResponse`.

use serde_json::{Map, Value};
use thiserror::Error;

const FENCE: &str = "```";

#[derive(Debug, Error)]
pub enum MalformedResponse {
    #[error("response was empty")]
    Empty,

    #[error("response opened a code fence but had no content")]
    FenceOnly,

    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("response JSON is not an object")]
    NotAnObject,
}

/// Parses the model output into a JSON object.
pub fn extract_payload(raw: &str) -> Result<Map<String, Value>, MalformedResponse> {
    let text = strip_fences(raw)?;
    if text.is_empty() {
        return Err(MalformedResponse::Empty);
    }
    match serde_json::from_str::<Value>(&text)? {
        Value::Object(map) => Ok(map),
        _ => Err(MalformedResponse::NotAnObject),
    }
}

/// Removes an opening ```lang line and, if present, the closing fence.
fn strip_fences(raw: &str) -> Result<String, MalformedResponse> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(MalformedResponse::Empty);
    }
    if !text.starts_with(FENCE) {
        return Ok(text.to_string());
    }

    let mut lines: Vec<&str> = text.lines().skip(1).collect();
    if lines.is_empty() {
        return Err(MalformedResponse::FenceOnly);
    }
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    if lines.last().is_some_and(|l| l.trim().starts_with(FENCE)) {
        lines.pop();
    }
    Ok(lines.join("\n").trim().to_string())
}

/// One-line, bounded preview of a response for log output.
pub fn snippet(raw: &str) -> String {
    const MAX_CHARS: usize = 200;
    let flat = raw.trim().replace('\n', " ");
    if flat.chars().count() > MAX_CHARS {
        let head: String = flat.chars().take(MAX_CHARS).collect();
        format!("{head}...")
    } else {
        flat
    }
}
