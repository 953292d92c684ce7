//! Page-by-page extraction: tables first, anchored text as the fallback.

use tracing::debug;

use super::DocumentStrategy;
use crate::error::Result;
use crate::models::config::PdfConfig;
use crate::models::row::{ExtractedRow, Extraction, ExtractionMethod};
use crate::parser::{parse_table_row, parse_text};
use crate::pdf::{PageSource, Table, TableMode};

/// Rows of one page and how they were found.
#[derive(Debug, Clone, PartialEq)]
pub struct PageOutcome {
    pub rows: Vec<ExtractedRow>,
    /// Tables detected on the page; zero means the text fallback ran.
    pub tables: usize,
}

/// Extract one page.
///
/// Lines mode is tried, then text mode; a mode that errors counts as
/// finding nothing. When any table is found every row is parsed as a table
/// row and the page text is never read. Otherwise the page text (layout
/// mode, retried plain when empty) is scanned for anchors.
pub fn extract_page(source: &dyn PageSource, page: u32, layout: bool) -> PageOutcome {
    let tables = find_tables(source, page);
    if !tables.is_empty() {
        let rows = tables
            .iter()
            .flat_map(|table| table.rows.iter())
            .filter_map(|cells| parse_table_row(cells))
            .collect();
        return PageOutcome {
            rows,
            tables: tables.len(),
        };
    }

    let text = page_text(source, page, layout);
    PageOutcome {
        rows: parse_text(&text),
        tables: 0,
    }
}

fn find_tables(source: &dyn PageSource, page: u32) -> Vec<Table> {
    for mode in [TableMode::Lines, TableMode::Text] {
        match source.extract_tables(page, mode) {
            Ok(tables) if !tables.is_empty() => return tables,
            Ok(_) => {}
            Err(e) => debug!("Page {}: {:?} table detection failed: {}", page, mode, e),
        }
    }
    Vec::new()
}

fn page_text(source: &dyn PageSource, page: u32, layout: bool) -> String {
    if layout {
        match source.extract_text(page, true) {
            Ok(text) if !text.trim().is_empty() => return text,
            Ok(_) => debug!("Page {}: empty layout text, retrying plain", page),
            Err(e) => debug!("Page {}: layout text failed: {}", page, e),
        }
    }
    source.extract_text(page, false).unwrap_or_else(|e| {
        debug!("Page {}: text extraction failed: {}", page, e);
        String::new()
    })
}

/// Runs [`extract_page`] over every page.
pub struct PageStrategy {
    layout_text: bool,
    max_pages: usize,
}

impl PageStrategy {
    pub fn new(config: &PdfConfig) -> Self {
        Self {
            layout_text: config.layout_text,
            max_pages: config.max_pages,
        }
    }
}

impl DocumentStrategy for PageStrategy {
    fn name(&self) -> &'static str {
        "page"
    }

    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::TextTables
    }

    fn extract(&self, source: &dyn PageSource) -> Result<Extraction> {
        let mut pages = source.page_count();
        if self.max_pages > 0 {
            pages = pages.min(self.max_pages as u32);
        }

        let mut rows = Vec::new();
        let mut rows_per_page = Vec::with_capacity(pages as usize);
        for page in 1..=pages {
            let outcome = extract_page(source, page, self.layout_text);
            debug!(
                "Page {}: {} rows from {}",
                page,
                outcome.rows.len(),
                if outcome.tables > 0 { "tables" } else { "text" }
            );
            rows_per_page.push(outcome.rows.len());
            rows.extend(outcome.rows);
        }

        Ok(Extraction {
            rows,
            rows_per_page,
            method: self.method(),
        })
    }
}
