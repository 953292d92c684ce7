//! Core library for trip log extraction.
//!
//! This crate provides:
//! - PDF page access (positioned text, ruled lines, embedded images)
//! - Table detection by ruled lines and by text alignment
//! - Row reconstruction from anchored report text
//! - The extraction ladder: page tables, alternate tables, OCR
//! - Sheet rows, deduplication and lap summaries

pub mod error;
pub mod models;
pub mod ocr;
pub mod parser;
pub mod pdf;
pub mod strategy;

pub use error::{Result, TripsheetError};
pub use models::{
    ExtractedRow, Extraction, ExtractionMethod, LapSummary, MergeOutcome, SheetRow,
    TripsheetConfig,
};
pub use ocr::TextRecognizer;
#[cfg(feature = "ocr")]
pub use ocr::OnnxRecognizer;
pub use pdf::{PageSource, PdfDocument};
pub use strategy::{DocumentStrategy, Extractor};
