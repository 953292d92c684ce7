//! Whitespace normalisation and tokenisation of record blocks.

use std::borrow::Cow;

use super::patterns::{SPLIT_DIGITS, WHITESPACE};

/// Collapse every whitespace run (newlines included) to one space and trim.
pub fn normalize_space(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Re-join digit sequences broken by a line wrap (`"12\n3"` -> `"123"`).
pub fn join_split_digits(text: &str) -> Cow<'_, str> {
    SPLIT_DIGITS.replace_all(text, "${1}${2}")
}

/// Turn a raw block into an ordered token sequence.
///
/// Empty or whitespace-only input yields no tokens.
pub fn tokenize(block: &str) -> Vec<String> {
    let joined = join_split_digits(block);
    let normalized = normalize_space(&joined);
    if normalized.is_empty() {
        return Vec::new();
    }
    normalized.split(' ').map(str::to_string).collect()
}

/// True when `token` is made of ASCII digits only and its length is within
/// `min..=max`.
pub(crate) fn is_digits_len(token: &str, min: usize, max: usize) -> bool {
    is_digits(token) && (min..=max).contains(&token.len())
}

/// True when `token` is non-empty and all ASCII digits.
pub(crate) fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tokenize_collapses_whitespace() {
        assert_eq!(
            tokenize("  12  ABCD12\n\tJUAN  "),
            vec!["12", "ABCD12", "JUAN"]
        );
    }

    #[test]
    fn test_tokenize_joins_split_digits() {
        assert_eq!(tokenize("12\n3 AB"), vec!["123", "AB"]);
        assert_eq!(tokenize("1234567 \n 89012"), vec!["123456789012"]);
    }

    #[test]
    fn test_tokenize_keeps_letters_split_by_newline() {
        assert_eq!(tokenize("AB\nCD"), vec!["AB", "CD"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" \n ").is_empty());
    }

    #[test]
    fn test_digit_helpers() {
        assert!(is_digits("0123"));
        assert!(!is_digits(""));
        assert!(!is_digits("12a"));
        assert!(is_digits_len("123", 1, 3));
        assert!(!is_digits_len("1234", 1, 3));
    }
}
