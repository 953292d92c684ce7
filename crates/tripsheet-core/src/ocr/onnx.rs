//! Recognizer backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).

use std::sync::Mutex;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info, trace};

use super::{reading_order_text, TextBox, TextRecognizer};
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// Detection plus recognition models loaded from the configured directory.
pub struct OnnxRecognizer {
    engine: Mutex<pure_onnx_ocr::engine::OcrEngine>,
    keep_unk: bool,
}

impl OnnxRecognizer {
    /// Load the models named in `config` from its model directory.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let det_path = config.model_path(&config.detection_model);
        let rec_path = config.model_path(&config.recognition_model);
        let dict_path = config.model_path(&config.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!("missing {}", path.display())));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", config.model_dir.display());

        Ok(Self {
            engine: Mutex::new(engine),
            keep_unk: config.keep_unk,
        })
    }
}

impl TextRecognizer for OnnxRecognizer {
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();
        trace!("Recognizing {}x{} image (language hint {})", width, height, language);

        let engine = self
            .engine
            .lock()
            .map_err(|_| OcrError::Recognition("engine lock poisoned".to_string()))?;
        let results = engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;
        drop(engine);

        debug!("pure-onnx-ocr returned {} text regions", results.len());

        let boxes: Vec<TextBox> = results
            .iter()
            .map(|r| {
                let text = if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                TextBox {
                    rect: polygon_rect(&r.bounding_box),
                    text,
                    confidence: r.confidence,
                }
            })
            .collect();

        let text = reading_order_text(boxes);
        debug!("OCR complete in {}ms", start.elapsed().as_millis());
        Ok(text)
    }
}

/// Axis-aligned bounds of a detection polygon.
fn polygon_rect(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f32, f32, f32, f32) {
    let mut rect = (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);
    for coord in polygon.exterior().coords() {
        let (x, y) = (coord.x as f32, coord.y as f32);
        rect.0 = rect.0.min(x);
        rect.1 = rect.1.min(y);
        rect.2 = rect.2.max(x);
        rect.3 = rect.3.max(y);
    }
    rect
}
