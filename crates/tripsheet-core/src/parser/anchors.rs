//! Date/time anchors marking the start of each record.

use super::patterns::DATE_TIME_ANCHOR;

/// A date (and optional time) found in page or row text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub fecha: String,
    pub hora: Option<String>,
    /// Byte offset where the anchor starts.
    pub start: usize,
    /// Byte offset just past the anchor (and its time, if any).
    pub end: usize,
}

/// All anchors in `text`, in order, non-overlapping.
pub fn find_anchors(text: &str) -> Vec<Anchor> {
    DATE_TIME_ANCHOR
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Anchor {
                fecha: caps.name("fecha")?.as_str().to_string(),
                hora: caps.name("hora").map(|m| m.as_str().to_string()),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// The first anchor in `text`, if any.
pub fn first_anchor(text: &str) -> Option<Anchor> {
    find_anchors(text).into_iter().next()
}

/// Pair every anchor with its block: the text between the end of the
/// anchor and the start of the next one (or the end of `text`).
pub fn anchor_blocks(text: &str) -> Vec<(Anchor, &str)> {
    let anchors = find_anchors(text);
    let starts: Vec<usize> = anchors
        .iter()
        .skip(1)
        .map(|a| a.start)
        .chain(std::iter::once(text.len()))
        .collect();

    anchors
        .into_iter()
        .zip(starts)
        .map(|(anchor, next)| {
            let block = &text[anchor.end..next];
            (anchor, block)
        })
        .collect()
}
