//! Scrubs API keys and bearer tokens from text before it is logged.

use once_cell::sync::Lazy;
use regex::Regex;

static BEARER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Bearer\s+[a-zA-Z0-9\-\._~+/]+=*").unwrap());
static API_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(sk|gsk|sk-ant|sk-or)-[a-zA-Z0-9\-_]{16,}").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = BEARER_RE.replace_all(input, "Bearer [REDACTED]");
    API_KEY_RE.replace_all(&redacted, "[REDACTED_KEY]").into_owned()
}
