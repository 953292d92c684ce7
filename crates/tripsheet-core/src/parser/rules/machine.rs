//! Machine number.

use super::{parse_number, Taken};
use crate::parser::tokens::is_digits_len;

/// How many tokens past the cursor may hold the machine number.
const MACHINE_WINDOW: usize = 5;

/// First 1-3 digit token within the next five tokens.
pub fn take_machine(tokens: &[String], cursor: usize) -> Taken<u32> {
    let end = tokens.len().min(cursor + MACHINE_WINDOW);
    for (i, token) in tokens.iter().enumerate().take(end).skip(cursor) {
        if is_digits_len(token, 1, 3) {
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
    fn test_machine_first_token() {
        assert_eq!(take_machine(&toks(&["12", "ABCD12"]), 0), (Some(12), 1));
    }

    #[test]
    fn test_machine_skips_noise() {
        let tokens = toks(&["Maq.", "N°", "7", "ABCD12"]);
        assert_eq!(take_machine(&tokens, 0), (Some(7), 3));
    }

    #[test]
    fn test_machine_outside_window() {
        let tokens = toks(&["a", "b", "c", "d", "e", "5"]);
        assert_eq!(take_machine(&tokens, 0), (None, 0));
    }

    #[test]
    fn test_machine_ignores_long_numbers() {
        let tokens = toks(&["1234", "123456789012"]);
        assert_eq!(take_machine(&tokens, 0), (None, 0));
    }
}
