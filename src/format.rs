//! Summary text assembly.

/// Joins words with single spaces and trims the result.
pub fn format<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Number of whitespace-separated words across `words`.
///
/// Blank entries count for nothing.
pub fn word_count<S: AsRef<str>>(words: &[S]) -> usize {
    words
        .iter()
        .map(|w| w.as_ref().split_whitespace().count())
        .sum()
}
