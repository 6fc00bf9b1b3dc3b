use once_cell::sync::Lazy;
use regex::Regex;

// Unicode-aware \w so Hangul and other letters survive; only punctuation
// and symbols are stripped.
static RE_NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Canonical text form used by both key derivation and session correlation:
/// lowercase, strip non-word characters, collapse whitespace runs, trim.
/// Pure and total; order matters (strip before collapse, so removed
/// punctuation cannot leave double spaces behind).
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = RE_NON_WORD.replace_all(&lowered, "");
    let collapsed = RE_WHITESPACE.replace_all(&stripped, " ");
    collapsed.trim().to_string()
}
