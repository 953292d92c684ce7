//! Trip record data model.

use serde::{Deserialize, Serialize};

/// One trip/lap record recovered from a report.
///
/// `fecha` and `folio` are the only required fields; everything else is
/// best-effort and may be absent. Rows are never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtractedRow {
    /// Date as found in the report (`DD-MM-YYYY` or `DD/MM/YYYY`).
    #[serde(rename = "Fecha")]
    pub fecha: String,

    /// Time (`HH:MM:SS`).
    #[serde(rename = "Hora")]
    pub hora: Option<String>,

    /// Machine number.
    #[serde(rename = "Máquina")]
    pub maquina: Option<u32>,

    /// Vehicle plate, 4 letters followed by 2 digits.
    #[serde(rename = "Patente")]
    pub patente: Option<String>,

    /// Record identifier, 12 to 16 digits.
    #[serde(rename = "Folio")]
    pub folio: String,

    /// Route variant (3 digits).
    #[serde(rename = "Variante")]
    pub variante: Option<u32>,

    /// Frequency.
    #[serde(rename = "Frecuencia")]
    pub frecuencia: Option<u32>,

    /// Driver name.
    #[serde(rename = "Conductor")]
    pub conductor: Option<String>,

    #[serde(rename = "AB")]
    pub ab: Option<u32>,

    #[serde(rename = "SD")]
    pub sd: Option<u32>,

    #[serde(rename = "CI")]
    pub ci: Option<u32>,

    /// Percentage kept as text with its trailing `%` (e.g. `"12.5%"`).
    #[serde(rename = "%")]
    pub porcentaje: Option<String>,

    #[serde(rename = "EV")]
    pub ev: Option<u32>,

    #[serde(rename = "TE")]
    pub te: Option<u32>,
}

impl ExtractedRow {
    /// Create a row with only the required fields set.
    pub fn new(fecha: impl Into<String>, folio: impl Into<String>) -> Self {
        Self {
            fecha: fecha.into(),
            hora: None,
            maquina: None,
            patente: None,
            folio: folio.into(),
            variante: None,
            frecuencia: None,
            conductor: None,
            ab: None,
            sd: None,
            ci: None,
            porcentaje: None,
            ev: None,
            te: None,
        }
    }

    /// A row is valid when both date and folio are present.
    pub fn is_valid(&self) -> bool {
        !self.fecha.trim().is_empty() && !self.folio.trim().is_empty()
    }
}

/// Which strategy produced an extraction result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Page-by-page table detection with text fallback.
    TextTables,
    /// Alternate whole-document table backend.
    AltTables,
    /// Rasterised pages through OCR.
    Ocr,
    /// Nothing matched.
    None,
}

impl ExtractionMethod {
    /// Provenance label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            ExtractionMethod::TextTables => "text (tables)",
            ExtractionMethod::AltTables => "tabula",
            ExtractionMethod::Ocr => "ocr",
            ExtractionMethod::None => "none",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of extracting one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// Rows in document scan order.
    pub rows: Vec<ExtractedRow>,

    /// Rows contributed by each page; empty when a document-level
    /// strategy won.
    pub rows_per_page: Vec<usize>,

    /// Strategy that produced `rows`.
    pub method: ExtractionMethod,
}

impl Extraction {
    /// An empty result labelled `none`.
    pub fn none() -> Self {
        Self {
            rows: Vec::new(),
            rows_per_page: Vec::new(),
            method: ExtractionMethod::None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_validity() {
        assert!(ExtractedRow::new("01-02-2024", "123456789012").is_valid());
        assert!(!ExtractedRow::new("", "123456789012").is_valid());
        assert!(!ExtractedRow::new("01-02-2024", " ").is_valid());
    }

    #[test]
    fn test_method_labels() {
        assert_eq!(ExtractionMethod::TextTables.label(), "text (tables)");
        assert_eq!(ExtractionMethod::AltTables.to_string(), "tabula");
        assert_eq!(ExtractionMethod::None.label(), "none");
    }

    #[test]
    fn test_row_serializes_with_column_names() {
        let mut row = ExtractedRow::new("01-02-2024", "123456789012");
        row.porcentaje = Some("12.5%".to_string());
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["Fecha"], "01-02-2024");
        assert_eq!(json["%"], "12.5%");
        assert!(json["Máquina"].is_null());
    }
}
