//! Route variant and frequency.

use super::parse_number;
use crate::parser::tokens::is_digits_len;

const WINDOW: usize = 6;

/// Variant (exactly 3 digits) then frequency (1-3 digits), each searched
/// within six tokens. Returns `(variant, frequency, next_cursor)`.
///
/// When no variant is found the frequency search starts from `cursor`.
pub fn take_variant_frequency(
    tokens: &[String],
    cursor: usize,
) -> (Option<u32>, Option<u32>, usize) {
    let (variant, cursor) = first_in_window(tokens, cursor, 3, 3);
    let (frequency, cursor) = first_in_window(tokens, cursor, 1, 3);
    (variant, frequency, cursor)
}

fn first_in_window(tokens: &[String], cursor: usize, min: usize, max: usize) -> (Option<u32>, usize) {
    let end = tokens.len().min(cursor + WINDOW);
    for (i, token) in tokens.iter().enumerate().take(end).skip(cursor) {
        if is_digits_len(token, min, max) {
            return (parse_number(token), i + 1);
        }
    }
    (None, cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_variant_and_frequency() {
        let tokens = toks(&["101", "12", "JUAN", "PEREZ"]);
        assert_eq!(take_variant_frequency(&tokens, 0), (Some(101), Some(12), 2));
    }

    #[test]
    fn test_frequency_without_variant() {
        let tokens = toks(&["12", "JUAN", "1|2|3"]);
        assert_eq!(take_variant_frequency(&tokens, 0), (None, Some(12), 1));
    }

    #[test]
    fn test_variant_skips_short_numbers() {
        // Tokens skipped while looking for the variant are not revisited.
        let tokens = toks(&["12", "205", "4"]);
        assert_eq!(take_variant_frequency(&tokens, 0), (Some(205), Some(4), 3));
    }

    #[test]
    fn test_neither_found() {
        let tokens = toks(&["JUAN", "PEREZ"]);
        assert_eq!(take_variant_frequency(&tokens, 0), (None, None, 0));
    }
}
