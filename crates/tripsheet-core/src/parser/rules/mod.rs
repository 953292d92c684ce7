//! Cursor-based field reconstructors.
//!
//! Every reconstructor takes the block's tokens and a cursor and returns the
//! value it found together with the cursor for the next reconstructor. On a
//! miss the cursor comes back unchanged, so a missing field never swallows
//! tokens belonging to the fields after it.

pub mod counters;
pub mod folio;
pub mod machine;
pub mod plate;
pub mod variant;

pub use counters::{split_driver_counters, take_percent_pair, DriverCounters, PercentPair};
pub use folio::take_folio;
pub use machine::take_machine;
pub use plate::reconstruct_plate;
pub use variant::take_variant_frequency;

/// A reconstructed value and the cursor following it.
pub type Taken<T> = (Option<T>, usize);

/// Parse a numeric field; overflow leaves the field absent.
pub(crate) fn parse_number(text: &str) -> Option<u32> {
    text.parse().ok()
}
