//! PDF processing module.

pub mod content;
pub mod font;
mod extractor;
pub mod grid;
pub mod layout;

pub use extractor::PdfDocument;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Grid detection heuristic used for per-page table extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    /// Cell boundaries come from ruled lines and rectangle edges.
    Lines,
    /// Cell boundaries come from words aligned across several lines.
    Text,
}

/// Whole-document table reading used by the alternate backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentTableMode {
    /// Only runs of lines that split into several cells.
    Lattice,
    /// Every line is a row.
    Stream,
}

/// A detected table: rows of cell texts, top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Access to an opened document, page by page.
///
/// Pages are numbered from 1.
pub trait PageSource {
    /// Get the number of pages in the document.
    fn page_count(&self) -> u32;

    /// Detect tables on a page with the given heuristic.
    fn extract_tables(&self, page: u32, mode: TableMode) -> Result<Vec<Table>>;

    /// Extract the text of a page, optionally preserving horizontal layout.
    fn extract_text(&self, page: u32, layout: bool) -> Result<String>;

    /// Page images at roughly the requested resolution, for OCR.
    fn render_page(&self, page: u32, dpi: u32) -> Result<Vec<DynamicImage>>;

    /// Tables read from the whole document by the alternate text decoder.
    fn document_tables(&self, mode: DocumentTableMode) -> Result<Vec<Table>>;
}
