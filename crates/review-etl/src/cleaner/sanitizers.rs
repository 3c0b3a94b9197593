//! Per-value text sanitization.

use once_cell::sync::Lazy;
use regex::Regex;

// Catalog/SKU style codes such as "AA-BB12-ZZ"
static CODE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z0-9]+-[A-Z0-9]+(-[A-Z0-9]+)?\b").expect("Invalid regex: code token")
});

static NON_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z]").expect("Invalid regex: non-letter"));

static SINGLE_CHAR_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\b").expect("Invalid regex: single char word"));

static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"( )+").expect("Invalid regex: spaces"));

/// Normalize one free-text value.
///
/// Steps run in a fixed order, each feeding the next: code tokens, then
/// every non-letter character, then single-letter words are replaced by a
/// space; space runs collapse to one space and the ends are trimmed.
pub(crate) fn normalize_text_value(value: &str) -> String {
    let text = CODE_TOKEN.replace_all(value, " ");
    let text = NON_LETTER.replace_all(&text, " ");
    let text = SINGLE_CHAR_WORD.replace_all(&text, " ");
    let text = SPACE_RUN.replace_all(&text, " ");
    text.trim().to_string()
}
