//! Canonical plate keys.

/// Canonicalize raw plate text into a comparable key.
///
/// Uppercases and keeps only ASCII letters and digits, so surrounding and
/// internal whitespace, separators (`-`, `.`, `·`) and non-Latin glyphs
/// disappear. Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Whether an already normalized key looks like a plate: length within
/// `min_len..=max_len` characters and at least one digit and one letter.
/// Only meaningful for keys produced by [`normalize`].
pub fn is_plate_shaped(normalized: &str, min_len: usize, max_len: usize) -> bool {
    let len = normalized.chars().count();
    if len < min_len || len > max_len {
        return false;
    }

    let has_digit = normalized.chars().any(|c| c.is_ascii_digit());
    let has_alpha = normalized.chars().any(|c| c.is_ascii_alphabetic());

    has_digit && has_alpha
}
