//! Driver name, AB|SD|CI counters, percentage and EV|TE pair.
//!
//! These work on the text left after the fixed-position fields, since the
//! driver name has no shape of its own: it is whatever sits before the
//! first `a|b|c` group.

use super::parse_number;
use crate::parser::patterns::{PAIR_PIPE, PERCENT, TRIPLE_PIPE};
use crate::parser::tokens::normalize_space;

/// Driver plus the triple counter, and the text following the triple.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverCounters<'a> {
    pub conductor: Option<String>,
    pub ab: Option<u32>,
    pub sd: Option<u32>,
    pub ci: Option<u32>,
    /// Where the percentage and event pair are searched.
    pub tail: &'a str,
}

/// Split the remainder into the driver name and the `AB|SD|CI` triple.
///
/// Without a triple the whole remainder is the driver and the tail is the
/// remainder itself.
pub fn split_driver_counters(rest: &str) -> DriverCounters<'_> {
    match TRIPLE_PIPE.captures(rest) {
        Some(caps) => {
            let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
            DriverCounters {
                conductor: non_empty(normalize_space(&rest[..whole.0])),
                ab: parse_number(&caps[1]),
                sd: parse_number(&caps[2]),
                ci: parse_number(&caps[3]),
                tail: &rest[whole.1..],
            }
        }
        None => DriverCounters {
            conductor: non_empty(normalize_space(rest)),
            tail: rest,
            ..Default::default()
        },
    }
}

/// Percentage and `EV|TE` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PercentPair {
    /// Percentage with a decimal point and trailing `%`, e.g. `"12.5%"`.
    pub porcentaje: Option<String>,
    pub ev: Option<u32>,
    pub te: Option<u32>,
}

/// Percentage first, then the pair after it (or from the start of `zone`
/// when there is no percentage).
pub fn take_percent_pair(zone: &str) -> PercentPair {
    let mut result = PercentPair::default();

    let after = match PERCENT.captures(zone) {
        Some(caps) => {
            result.porcentaje = Some(format!("{}%", caps[1].replace(',', ".")));
            caps.get(0).map(|m| &zone[m.end()..]).unwrap_or(zone)
        }
        None => zone,
    };

    if let Some(caps) = PAIR_PIPE.captures(after) {
        result.ev = parse_number(&caps[1]);
        result.te = parse_number(&caps[2]);
    }

    result
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
