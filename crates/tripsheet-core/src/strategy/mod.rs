//! Extraction strategies and the document-level orchestrator.
//!
//! A document goes through the strategies in order until one yields rows:
//! page-by-page tables with a text fallback, then the alternate
//! whole-document table backend, then OCR.

mod alt_tables;
mod ocr;
mod page;

pub use alt_tables::AltTableStrategy;
pub use ocr::OcrStrategy;
pub use page::{extract_page, PageOutcome, PageStrategy};

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::config::TripsheetConfig;
use crate::models::row::{Extraction, ExtractionMethod};
use crate::ocr::TextRecognizer;
use crate::pdf::{PageSource, PdfDocument};

/// One rung of the extraction ladder.
pub trait DocumentStrategy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Label given to rows this strategy produces.
    fn method(&self) -> ExtractionMethod;

    /// Whether the backend is compiled in and enabled.
    fn is_available(&self) -> bool {
        true
    }

    /// Run over a whole document.
    fn extract(&self, source: &dyn PageSource) -> Result<Extraction>;
}

/// Runs strategies in order and keeps the first non-empty result.
pub struct Extractor {
    strategies: Vec<Box<dyn DocumentStrategy>>,
}

impl Extractor {
    /// The default ladder for a configuration.
    ///
    /// With the `ocr` feature and OCR enabled, models are loaded from the
    /// configured directory; a load failure leaves OCR unavailable.
    pub fn new(config: &TripsheetConfig) -> Self {
        let recognizer = load_recognizer(config);
        Self::with_recognizer_option(config, recognizer)
    }

    /// The default ladder with a caller-supplied recognizer.
    pub fn with_recognizer(config: &TripsheetConfig, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self::with_recognizer_option(config, Some(recognizer))
    }

    /// A custom ladder.
    pub fn with_strategies(strategies: Vec<Box<dyn DocumentStrategy>>) -> Self {
        Self { strategies }
    }

    fn with_recognizer_option(
        config: &TripsheetConfig,
        recognizer: Option<Arc<dyn TextRecognizer>>,
    ) -> Self {
        Self::with_strategies(vec![
            Box::new(PageStrategy::new(&config.pdf)),
            Box::new(AltTableStrategy::new(config.extraction.alt_tables)),
            Box::new(OcrStrategy::new(config, recognizer)),
        ])
    }

    /// Names of the strategies in order, with availability.
    pub fn strategies(&self) -> Vec<(&'static str, bool)> {
        self.strategies
            .iter()
            .map(|s| (s.name(), s.is_available()))
            .collect()
    }

    /// Extract rows from an opened document.
    ///
    /// Strategy errors count as "no rows" so the next strategy still runs.
    pub fn extract(&self, source: &dyn PageSource) -> Extraction {
        for strategy in &self.strategies {
            if !strategy.is_available() {
                debug!("Skipping unavailable strategy {}", strategy.name());
                continue;
            }

            match strategy.extract(source) {
                Ok(extraction) if !extraction.is_empty() => {
                    info!(
                        "Extracted {} rows via {}",
                        extraction.rows.len(),
                        extraction.method
                    );
                    return extraction;
                }
                Ok(_) => debug!("Strategy {} found no rows", strategy.name()),
                Err(e) => warn!("Strategy {} failed: {}", strategy.name(), e),
            }
        }

        info!("No rows found by any strategy");
        Extraction::none()
    }

    /// Open a document from bytes and extract it.
    pub fn extract_bytes(&self, data: &[u8]) -> Result<Extraction> {
        let document = PdfDocument::load(data)?;
        Ok(self.extract(&document))
    }

    /// Open a document from disk and extract it.
    pub fn extract_file(&self, path: impl AsRef<Path>) -> Result<Extraction> {
        let document = PdfDocument::open(path)?;
        Ok(self.extract(&document))
    }
}

#[cfg(feature = "ocr")]
fn load_recognizer(config: &TripsheetConfig) -> Option<Arc<dyn TextRecognizer>> {
    if !config.extraction.use_ocr {
        return None;
    }
    match crate::ocr::OnnxRecognizer::from_config(&config.ocr) {
        Ok(recognizer) => Some(Arc::new(recognizer)),
        Err(e) => {
            warn!("OCR disabled: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "ocr"))]
fn load_recognizer(config: &TripsheetConfig) -> Option<Arc<dyn TextRecognizer>> {
    if config.extraction.use_ocr {
        warn!("OCR requested but this build has no OCR backend");
    }
    None
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory page source shared by the strategy tests.

    use std::cell::Cell;

    use image::DynamicImage;

    use crate::error::PdfError;
    use crate::pdf::{self, DocumentTableMode, PageSource, Table, TableMode};

    #[derive(Default, Clone)]
    pub struct FakePage {
        pub lines_tables: Vec<Table>,
        pub text_tables: Vec<Table>,
        pub layout_text: String,
        pub plain_text: String,
        pub images: usize,
        pub fail_tables: bool,
    }

    #[derive(Default)]
    pub struct FakeSource {
        pub pages: Vec<FakePage>,
        pub lattice: Vec<Table>,
        pub stream: Vec<Table>,
        pub text_calls: Cell<usize>,
    }

    impl FakeSource {
        pub fn with_pages(pages: Vec<FakePage>) -> Self {
            Self {
                pages,
                ..Default::default()
            }
        }

        fn page(&self, page: u32) -> pdf::Result<&FakePage> {
            self.pages
                .get(page as usize - 1)
                .ok_or(PdfError::InvalidPage(page))
        }
    }

    impl PageSource for FakeSource {
        fn page_count(&self) -> u32 {
            self.pages.len() as u32
        }

        fn extract_tables(&self, page: u32, mode: TableMode) -> pdf::Result<Vec<Table>> {
            let page = self.page(page)?;
            if page.fail_tables {
                return Err(PdfError::TextExtraction("broken table".to_string()));
            }
            Ok(match mode {
                TableMode::Lines => page.lines_tables.clone(),
                TableMode::Text => page.text_tables.clone(),
            })
        }

        fn extract_text(&self, page: u32, layout: bool) -> pdf::Result<String> {
            self.text_calls.set(self.text_calls.get() + 1);
            let page = self.page(page)?;
            Ok(if layout {
                page.layout_text.clone()
            } else {
                page.plain_text.clone()
            })
        }

        fn render_page(&self, page: u32, _dpi: u32) -> pdf::Result<Vec<DynamicImage>> {
            let page = self.page(page)?;
            Ok((0..page.images).map(|_| DynamicImage::new_rgb8(4, 4)).collect())
        }

        fn document_tables(&self, mode: DocumentTableMode) -> pdf::Result<Vec<Table>> {
            Ok(match mode {
                DocumentTableMode::Lattice => self.lattice.clone(),
                DocumentTableMode::Stream => self.stream.clone(),
            })
        }
    }

    pub fn row_table(rows: &[&[&str]]) -> Table {
        Table::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }
}
