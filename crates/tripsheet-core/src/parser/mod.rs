//! Row reconstruction from report text.
//!
//! Text is cut into blocks at date/time anchors, each block is tokenised and
//! the field reconstructors in [`rules`] run over the tokens in a fixed
//! order, each starting where the previous one stopped.

pub mod anchors;
mod block;
pub mod patterns;
pub mod rules;
pub mod tokens;

pub use anchors::{anchor_blocks, find_anchors, Anchor};
pub use block::{parse_block, parse_table_row, parse_text};
pub use tokens::{normalize_space, tokenize};
