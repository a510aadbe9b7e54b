//! Log Redaction Layer
//!
//! Scrubs API keys, bearer tokens, and inline base64 images from strings
//! before they reach the log sinks.

use regex::Regex;
use std::sync::LazyLock;

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9_\-]{20,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)|\b[a-f0-9]{64}\b").unwrap()
});
static DATA_URI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"data:([a-z]+/[a-z0-9.+\-]+);base64,[A-Za-z0-9+/=]+").unwrap());

/// Longest model reply kept verbatim in log lines.
pub const MAX_LOGGED_REPLY_CHARS: usize = 2000;

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = DATA_URI_RE.replace_all(input, "data:$1;base64,[REDACTED_IMAGE]");
    API_KEY_RE.replace_all(&redacted, "[REDACTED_TOKEN]").to_string()
}

/// Redact and truncate a model reply for logging.
pub fn loggable_reply(reply: &str) -> String {
    let clean = redact_sensitive_data(reply);
    if clean.chars().count() <= MAX_LOGGED_REPLY_CHARS {
        return clean;
    }
    let mut cut: String = clean.chars().take(MAX_LOGGED_REPLY_CHARS).collect();
    cut.push_str("…[truncated]");
    cut
}
