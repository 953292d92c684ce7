//! Last resort for scanned reports: page images through a recognizer.

use std::sync::Arc;

use tracing::{debug, warn};

use super::DocumentStrategy;
use crate::error::{Result, TripsheetError};
use crate::models::config::TripsheetConfig;
use crate::models::row::{Extraction, ExtractionMethod};
use crate::ocr::TextRecognizer;
use crate::parser::parse_text;
use crate::pdf::PageSource;

/// Rasterises every page, recognizes each image and scans the joined text
/// for anchors. Available only when enabled and a recognizer is present.
pub struct OcrStrategy {
    recognizer: Option<Arc<dyn TextRecognizer>>,
    enabled: bool,
    language: String,
    dpi: u32,
}

impl OcrStrategy {
    pub fn new(config: &TripsheetConfig, recognizer: Option<Arc<dyn TextRecognizer>>) -> Self {
        Self {
            recognizer,
            enabled: config.extraction.use_ocr,
            language: config.extraction.ocr_language.clone(),
            dpi: config.pdf.render_dpi,
        }
    }
}

impl DocumentStrategy for OcrStrategy {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Ocr
    }

    fn is_available(&self) -> bool {
        self.enabled && self.recognizer.is_some()
    }

    fn extract(&self, source: &dyn PageSource) -> Result<Extraction> {
        let recognizer = self
            .recognizer
            .as_ref()
            .ok_or(TripsheetError::Ocr(crate::error::OcrError::Unavailable))?;

        let mut texts = Vec::new();
        for page in 1..=source.page_count() {
            let images = match source.render_page(page, self.dpi) {
                Ok(images) => images,
                Err(e) => {
                    warn!("Failed to rasterise page {}: {}", page, e);
                    continue;
                }
            };
            debug!("Page {}: {} images", page, images.len());
            for image in &images {
                texts.push(recognizer.recognize(image, &self.language)?);
            }
        }

        let rows = parse_text(&texts.join("\n"));
        let rows_per_page = vec![rows.len()];
        Ok(Extraction {
            rows,
            rows_per_page,
            method: self.method(),
        })
    }
}
