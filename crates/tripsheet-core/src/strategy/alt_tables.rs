//! Whole-document tables read by the alternate text decoder.

use tracing::debug;

use super::DocumentStrategy;
use crate::error::Result;
use crate::models::row::{Extraction, ExtractionMethod};
use crate::parser::parse_table_row;
use crate::pdf::{DocumentTableMode, PageSource};

/// Lattice tables first, then stream tables; rows are parsed like page
/// table rows. Per-page counts are not tracked.
pub struct AltTableStrategy {
    enabled: bool,
}

impl AltTableStrategy {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl DocumentStrategy for AltTableStrategy {
    fn name(&self) -> &'static str {
        "alt-tables"
    }

    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::AltTables
    }

    fn is_available(&self) -> bool {
        self.enabled && cfg!(feature = "alt-tables")
    }

    fn extract(&self, source: &dyn PageSource) -> Result<Extraction> {
        for mode in [DocumentTableMode::Lattice, DocumentTableMode::Stream] {
            let tables = source.document_tables(mode)?;
            let rows: Vec<_> = tables
                .iter()
                .flat_map(|table| table.rows.iter())
                .filter_map(|cells| parse_table_row(cells))
                .collect();
            debug!("{:?} mode: {} tables, {} rows", mode, tables.len(), rows.len());

            if !rows.is_empty() {
                return Ok(Extraction {
                    rows,
                    rows_per_page: Vec::new(),
                    method: self.method(),
                });
            }
        }
        Ok(Extraction::none())
    }
}
