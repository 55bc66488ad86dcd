//! Code-fence normalization for model output.
//!
//! Generation runs are told to answer with bare JSON, but often wrap it in a
//! Markdown block such as ```` ```json ... ``` ````. This module removes that
//! wrapper and nothing else.

use once_cell::sync::Lazy;
use regex::Regex;

const FENCE: &str = "```";

static OPENING_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^```(?:[A-Za-z][A-Za-z0-9_+.\-]*)?").expect("valid opening fence regex")
});

/// Strips a leading code fence (with optional language tag) and a trailing
/// code fence, trimming whitespace around both.
///
/// Text without fences is returned trimmed but otherwise untouched.
pub fn strip_code_fences(text: &str) -> &str {
    let mut current = text.trim();

    if let Some(found) = OPENING_FENCE_RE.find(current) {
        current = current[found.end()..].trim();
    }
    if let Some(stripped) = current.strip_suffix(FENCE) {
        current = stripped.trim();
    }

    current
}
