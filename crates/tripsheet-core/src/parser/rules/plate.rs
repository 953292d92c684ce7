//! Vehicle plate reconstruction.
//!
//! Plates are four letters followed by two digits (`ABCD12`), but report
//! layouts split them across tokens (`AB CD 12`) or push the last digit into
//! its own token (`ABCD1 2`). The search runs over a bounded window that
//! stops before the first long digit run, which is taken to be the folio.

use super::Taken;
use crate::parser::patterns::{LONG_DIGIT_RUN, NON_ALNUM, PLATE_FULL, PLATE_PARTIAL};
use crate::parser::tokens::is_digits_len;

/// Maximum tokens inspected past the cursor.
const PLATE_WINDOW: usize = 12;

/// Maximum tokens concatenated into one candidate.
const MAX_SPAN: usize = 6;

/// Reconstruct a plate starting at `cursor`.
pub fn reconstruct_plate(tokens: &[String], cursor: usize) -> Taken<String> {
    let limit = window_limit(tokens, cursor);

    for i in cursor..limit {
        for j in i..(i + MAX_SPAN).min(limit) {
            let candidate = clean_span(&tokens[i..=j]);
            if let Some(m) = PLATE_FULL.find(&candidate) {
                return (Some(m.as_str().to_string()), j + 1);
            }
        }
    }

    // AAAA0 followed directly by a lone digit token. The digit must still
    // be inside the window: a folio between the two ends the window first.
    for i in cursor..limit {
        for j in i..(i + MAX_SPAN).min(limit) {
            let candidate = clean_span(&tokens[i..=j]);
            let Some(caps) = PLATE_PARTIAL.captures(&candidate) else {
                continue;
            };
            if j + 1 < limit && is_digits_len(&tokens[j + 1], 1, 1) {
                let plate = format!("{}{}", &caps[1], tokens[j + 1]);
                return (Some(plate), j + 2);
            }
        }
    }

    (None, cursor)
}

fn window_limit(tokens: &[String], cursor: usize) -> usize {
    let mut limit = tokens.len().min(cursor + PLATE_WINDOW);
    if let Some(k) = tokens
        .iter()
        .skip(cursor)
        .position(|t| LONG_DIGIT_RUN.is_match(t))
    {
        limit = limit.min(cursor + k);
    }
    limit
}

fn clean_span(span: &[String]) -> String {
    NON_ALNUM.replace_all(&span.join(" "), "").to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn toks(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plate_single_token() {
        let tokens = toks(&["123", "ABCD12", "123456789012", "999"]);
        assert_eq!(reconstruct_plate(&tokens, 1), (Some("ABCD12".to_string()), 2));
    }

    #[test]
    fn test_plate_split_across_tokens() {
        let tokens = toks(&["123", "AB", "CD", "12", "123456789012", "999"]);
        assert_eq!(reconstruct_plate(&tokens, 1), (Some("ABCD12".to_string()), 4));
    }

    #[test]
    fn test_plate_split_last_digit() {
        let tokens = toks(&["123", "ABCD1", "2", "123456789012", "999"]);
        assert_eq!(reconstruct_plate(&tokens, 1), (Some("ABCD12".to_string()), 3));
    }

    #[test]
    fn test_plate_no_match() {
        let tokens = toks(&["123", "Hola", "Mundo", "123456789012"]);
        assert_eq!(reconstruct_plate(&tokens, 1), (None, 1));
    }

    #[test]
    fn test_plate_interrupted_by_folio() {
        let tokens = toks(&["123", "ABCD1", "123456789012", "2"]);
        assert_eq!(reconstruct_plate(&tokens, 1), (None, 1));
    }

    #[test]
    fn test_plate_lowercase_and_punctuation() {
        let tokens = toks(&["7", "ab-cd", "12", "123456789012"]);
        assert_eq!(reconstruct_plate(&tokens, 1), (Some("ABCD12".to_string()), 3));
    }

    #[test]
    fn test_plate_with_leading_noise() {
        // Punctuation-only tokens vanish once the span is cleaned.
        let tokens = toks(&["XABCD1", "-", "3", "123456789012"]);
        assert_eq!(reconstruct_plate(&tokens, 0), (Some("ABCD13".to_string()), 3));
    }
}
