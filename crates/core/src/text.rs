//! Small string and parsing helpers shared by the extension pages

use regex::Regex;
use serde_json::Value;
use url::Url;

/// Default limit for [`clip_string`]
pub const CLIP_LIMIT: usize = 100;

/// Upper-case the first character
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Clamp `value` into `min..=max`
///
/// Unlike [`Ord::clamp`] this never panics when `min > max`; `min` wins.
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Cut a string to `limit` characters, appending `...` when clipped
pub fn clip_string(s: &str, limit: usize) -> String {
    match s.char_indices().nth(limit) {
        Some((end, _)) => format!("{}...", &s[..end]),
        None => s.to_string(),
    }
}

/// Escape the characters that are special in a regular expression
///
/// Only `{}()[]\.+*?^$|` are escaped; `-` and `/` pass through.
pub fn escape_regex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(
            c,
            '{' | '}' | '(' | ')' | '[' | ']' | '\\' | '.' | '+' | '*' | '?' | '^' | '$' | '|'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Build a regex matching `s` literally
pub fn literal_regex(s: &str) -> Option<Regex> {
    try_regex(&escape_regex(s))
}

/// Compile a regex, returning `None` for invalid patterns
pub fn try_regex(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(rx) => Some(rx),
        Err(e) => {
            tracing::trace!(pattern, error = %e, "invalid regex");
            None
        }
    }
}

/// Parse JSON, returning `None` on malformed input
pub fn try_json_parse(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// Parse an absolute URL, returning `None` for empty or malformed input
pub fn try_url(url: &str) -> Option<Url> {
    if url.is_empty() {
        return None;
    }
    Url::parse(url).ok()
}
