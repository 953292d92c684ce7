//! Regex patterns shared by the row reconstructors.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Date (DD-MM-YYYY or DD/MM/YYYY) with an optional time that may sit on
    // the following line.
    pub static ref DATE_TIME_ANCHOR: Regex = Regex::new(
        r"(?P<fecha>\d{2}[-/]\d{2}[-/]\d{4})(?:\s+(?P<hora>\d{2}:\d{2}:\d{2}))?"
    ).unwrap();

    // Digits split by a line break: "12\n3".
    pub static ref SPLIT_DIGITS: Regex = Regex::new(
        r"(\d)\s*\n\s*(\d)"
    ).unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    // Tokens
    pub static ref ALL_DIGITS: Regex = Regex::new(r"^\d+$").unwrap();
    pub static ref LONG_DIGIT_RUN: Regex = Regex::new(r"^\d{10,}$").unwrap();
    pub static ref NON_ALNUM: Regex = Regex::new(r"[^A-Za-z0-9]").unwrap();

    // Plates are matched against the cleaned concatenation of a token span
    // and must end it: AAAA00, or AAAA0 for the rescue path.
    pub static ref PLATE_FULL: Regex = Regex::new(r"[A-Z]{4}\d{2}$").unwrap();
    pub static ref PLATE_PARTIAL: Regex = Regex::new(r"([A-Z]{4}\d)$").unwrap();

    // Folio with hyphen/space separators between digits.
    pub static ref FOLIO_FLEX: Regex = Regex::new(r"(?:\d[\s-]?){12,16}").unwrap();

    // Counters
    pub static ref TRIPLE_PIPE: Regex = Regex::new(
        r"(\d+)\s*\|\s*(\d+)\s*\|\s*(\d+)"
    ).unwrap();

    pub static ref PAIR_PIPE: Regex = Regex::new(r"(\d+)\s*\|\s*(\d+)").unwrap();

    pub static ref PERCENT: Regex = Regex::new(r"(\d{1,3}(?:[.,]\d+)?)\s*%").unwrap();
}
