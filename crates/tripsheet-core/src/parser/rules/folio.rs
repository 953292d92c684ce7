//! Folio (record identifier) extraction.

use super::Taken;
use crate::parser::patterns::FOLIO_FLEX;
use crate::parser::tokens::{is_digits, is_digits_len};

/// Accepted length of a folio assembled from consecutive digit tokens.
const JOINED_MIN: usize = 12;
const JOINED_MAX: usize = 14;

/// Digit count past which joining consecutive tokens gives up.
const JOINED_CEILING: usize = 16;

/// Accepted length of a folio found in a single token.
const SINGLE_MIN: usize = 12;
const SINGLE_MAX: usize = 16;

/// Tokens scanned by the single-token fallbacks.
const FOLIO_WINDOW: usize = 8;

/// Find the folio at or after `cursor`.
///
/// Tried in order: consecutive digit tokens joined until they reach 12-14
/// digits; a single 12-16 digit token in the next eight tokens; a token
/// holding 12-16 digits broken by hyphens.
pub fn take_folio(tokens: &[String], cursor: usize) -> Taken<String> {
    let mut digits = String::new();
    for (i, token) in tokens.iter().enumerate().skip(cursor) {
        if !is_digits(token) {
            break;
        }
        digits.push_str(token);
        if (JOINED_MIN..=JOINED_MAX).contains(&digits.len()) {
            return (Some(digits), i + 1);
        }
        if digits.len() > JOINED_CEILING {
            break;
        }
    }

    let end = tokens.len().min(cursor + FOLIO_WINDOW);
    let window = move || tokens.iter().enumerate().take(end).skip(cursor);

    for (i, token) in window() {
        if is_digits_len(token, SINGLE_MIN, SINGLE_MAX) {
            return (Some(token.clone()), i + 1);
        }
    }

    for (i, token) in window() {
        if let Some(m) = FOLIO_FLEX.find(token) {
            let candidate: String = m.as_str().chars().filter(char::is_ascii_digit).collect();
            if (SINGLE_MIN..=SINGLE_MAX).contains(&candidate.len()) {
                return (Some(candidate), i + 1);
            }
        }
    }

    (None, cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn toks(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_folio_single_token() {
        let tokens = toks(&["123", "ABCD12", "123456789012", "999"]);
        assert_eq!(take_folio(&tokens, 2), (Some("123456789012".to_string()), 3));
    }

    #[test]
    fn test_folio_joined_tokens() {
        let tokens = toks(&["1234567", "89012", "101"]);
        assert_eq!(take_folio(&tokens, 0), (Some("123456789012".to_string()), 2));
    }

    #[test]
    fn test_folio_sixteen_digits_in_window() {
        // Joining overshoots past 16 digits; the window scan accepts the token.
        let tokens = toks(&["1234567890123456", "101"]);
        assert_eq!(
            take_folio(&tokens, 0),
            (Some("1234567890123456".to_string()), 1)
        );
    }

    #[test]
    fn test_folio_with_hyphens() {
        let tokens = toks(&["N°", "1234-5678-9012", "101"]);
        assert_eq!(take_folio(&tokens, 0), (Some("123456789012".to_string()), 2));
    }

    #[test]
    fn test_folio_missing() {
        let tokens = toks(&["101", "5", "JUAN", "PEREZ"]);
        assert_eq!(take_folio(&tokens, 0), (None, 0));
    }

    #[test]
    fn test_folio_beyond_window() {
        let tokens = toks(&["a", "b", "c", "d", "e", "f", "g", "h", "123456789012"]);
        assert_eq!(take_folio(&tokens, 0), (None, 0));
    }
}
