//! Text recognition for image-only pages.

#[cfg(feature = "ocr")]
mod onnx;

#[cfg(feature = "ocr")]
pub use onnx::OnnxRecognizer;

use image::DynamicImage;

use crate::error::OcrError;

/// Turns a page image into text.
pub trait TextRecognizer: Send + Sync {
    /// Recognize the text of an image. `language` is a hint such as `"spa"`;
    /// backends whose language is fixed by their model may ignore it.
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String, OcrError>;
}

/// A recognized text region.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    /// Axis-aligned bounds: left, top, right, bottom (image coordinates).
    pub rect: (f32, f32, f32, f32),
    pub text: String,
    pub confidence: f32,
}

/// Regions whose tops differ by less than this share a line.
const ROW_HEIGHT: f32 = 20.0;

/// Arrange regions in reading order: bucketed rows top to bottom, left to
/// right within a row. Regions of a row are joined by spaces, rows by
/// newlines.
pub fn reading_order_text(mut boxes: Vec<TextBox>) -> String {
    let row = |b: &TextBox| (b.rect.1 / ROW_HEIGHT) as i32;
    boxes.sort_by(|a, b| row(a).cmp(&row(b)).then(a.rect.0.total_cmp(&b.rect.0)));

    let mut lines: Vec<(i32, Vec<&str>)> = Vec::new();
    for b in &boxes {
        let text = b.text.trim();
        if text.is_empty() {
            continue;
        }
        match lines.last_mut() {
            Some((r, parts)) if *r == row(b) => parts.push(text),
            _ => lines.push((row(b), vec![text])),
        }
    }

    lines
        .into_iter()
        .map(|(_, parts)| parts.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_box(text: &str, x: f32, y: f32) -> TextBox {
        TextBox {
            rect: (x, y, x + 50.0, y + 12.0),
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_reading_order() {
        let boxes = vec![
            text_box("ABCD12", 120.0, 45.0),
            text_box("01-02-2024", 10.0, 42.0),
            text_box("REPORTE", 10.0, 5.0),
            text_box("  ", 300.0, 5.0),
            text_box("123456789012", 200.0, 41.0),
        ];
        assert_eq!(
            reading_order_text(boxes),
            "REPORTE\n01-02-2024 ABCD12 123456789012"
        );
    }

    #[test]
    fn test_reading_order_empty() {
        assert_eq!(reading_order_text(Vec::new()), "");
    }
}
