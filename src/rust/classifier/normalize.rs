/// Canonicalizes raw input before vectorization.
///
/// Every character that is not an ASCII letter or a word separator
/// is dropped (digits, punctuation, symbols, emoji, non-ASCII letters) and the
/// rest is lower-cased. Total and idempotent; empty or letter-free input
/// yields an empty or whitespace-only string.
///
/// ```
/// assert_eq!(hatescan::normalize("H3llo!"), "hllo");
/// ```
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|&c| c.is_ascii_alphabetic() || is_separator(c))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Unicode whitespace plus the ASCII information separators U+001C..=U+001F,
/// which the training pipeline also treated as word boundaries.
pub(crate) fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}
