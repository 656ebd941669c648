//! Small text helpers shared by the search services.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercases `text`, strips diacritics and collapses whitespace.
///
/// ```
/// use tervis_core::text::fold;
///
/// assert_eq!(fold("  São   Paulo "), "sao paulo");
/// ```
pub fn fold(text: &str) -> String {
    let stripped: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escapes `%`, `_` and `\` so user input is matched literally by `LIKE`.
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Wraps an already folded term into a `%term%` pattern.
pub fn contains_pattern(folded_term: &str) -> String {
    format!("%{}%", escape_like(folded_term))
}

/// Cuts `text` to `max_chars` characters, appending `...` when it was cut.
///
/// Counts characters, not bytes, so multi-byte text never splits mid-char.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", text[..byte_idx].trim_end()),
        None => text.to_string(),
    }
}
