//! Data models for extracted rows, sheets, and configuration.

pub mod config;
pub mod row;
pub mod sheet;

pub use config::{ExtractionConfig, OcrConfig, PdfConfig, TripsheetConfig};
pub use row::{ExtractedRow, Extraction, ExtractionMethod};
pub use sheet::{LapSummary, MergeOutcome, SheetRow};
