//! Best-effort JSON recovery from free-text model replies.
//!
//! Vision models wrap their answer in prose or code fences, use single
//! quotes, leave keys bare, add comments and trailing commas. The steps
//! below undo those habits in a fixed order and stop at the first parse
//! that succeeds.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCED_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap());
static OBJECT_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").unwrap());
static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"//.*").unwrap());
static BARE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([{,])\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*:").unwrap());
static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([}\]])").unwrap());

/// Pull the most likely JSON object out of `text`.
///
/// Returns `None` when there is no `{...}` span or it cannot be repaired
/// into valid JSON.
pub fn extract(text: &str) -> Option<Value> {
    let text = FENCED_OBJECT
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text, |m| m.as_str());

    let span = OBJECT_SPAN.find(text)?.as_str();

    let normalized = span.replace('\'', "\"");
    let normalized = BLOCK_COMMENT.replace_all(&normalized, "");
    let normalized = LINE_COMMENT.replace_all(&normalized, "");
    let candidate = normalized.trim_matches([' ', '\n', '\t', '\r']);

    if let Ok(value) = serde_json::from_str(candidate) {
        return Some(value);
    }

    let repaired = BARE_KEY.replace_all(candidate, "$1\"$2\":");
    let repaired = TRAILING_COMMA.replace_all(&repaired, "$1");
    serde_json::from_str(&repaired).ok()
}
