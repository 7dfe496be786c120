//! Term normalization for the TF-IDF vectorizer.

/// Terms shorter than this (in characters) are ignored.
pub const MIN_TERM_CHARS: usize = 2;

/// Split text into lowercase terms on non-alphanumeric boundaries.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TERM_CHARS)
        .map(str::to_lowercase)
}
