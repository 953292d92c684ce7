//! Spreadsheet-facing row form, merging and lap summaries.
//!
//! A [`SheetRow`] is the all-text rendering of an [`ExtractedRow`] using the
//! consolidated sheet's column set. Rows read back from an existing sheet go
//! through the same normalisation, so rows produced in different runs
//! compare equal when their visible content is equal.

use std::collections::{BTreeMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::row::ExtractedRow;
use crate::error::SheetError;

/// Column headers of the data sheet, in order.
pub const SHEET_COLUMNS: [&str; 13] = [
    "Fecha", "Maquina", "Patente", "Folio", "Variante", "Frec",
    "Conductores", "Ab", "SD", "CI", "%", "EV", "TE",
];

/// Column headers of the lap summary sheet.
pub const SUMMARY_COLUMNS: [&str; 3] = ["Patente", "Maquina", "Total Vueltas"];

/// Name of the data sheet.
pub const DATA_SHEET: &str = "Datos";

/// Name of the lap summary sheet.
pub const SUMMARY_SHEET: &str = "Resumen Vueltas";

lazy_static! {
    static ref TRAILING_ZERO: Regex = Regex::new(r"\.0$").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// One data-sheet row, every cell as normalised text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetRow {
    cells: [String; 13],
}

impl SheetRow {
    /// Render an extracted row.
    pub fn from_row(row: &ExtractedRow) -> Self {
        let num = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();
        let text = |v: &Option<String>| v.clone().unwrap_or_default();

        let raw = [
            row.fecha.clone(),
            num(row.maquina),
            text(&row.patente),
            row.folio.clone(),
            num(row.variante),
            num(row.frecuencia),
            text(&row.conductor),
            num(row.ab),
            num(row.sd),
            num(row.ci),
            normalize_percent(row.porcentaje.as_deref()),
            num(row.ev),
            num(row.te),
        ];
        Self {
            cells: raw.map(|c| normalize_cell(&c)),
        }
    }

    /// Build a row from a previously written record.
    ///
    /// Columns are matched by header name; unknown headers are ignored and
    /// absent optional columns are left empty. A sheet without a `Folio`
    /// column is not one of ours.
    pub fn from_record<S: AsRef<str>>(headers: &[S], values: &[S]) -> Result<Self, SheetError> {
        let index_of = |name: &str| headers.iter().position(|h| h.as_ref().trim() == name);
        if index_of("Folio").is_none() {
            return Err(SheetError::MissingColumn("Folio".to_string()));
        }

        let mut cells: [String; 13] = Default::default();
        for (slot, column) in cells.iter_mut().zip(SHEET_COLUMNS) {
            if let Some(value) = index_of(column).and_then(|i| values.get(i)) {
                *slot = normalize_cell(value.as_ref());
            }
        }
        cells[10] = normalize_cell(&normalize_percent(Some(cells[10].as_str())));

        Ok(Self { cells })
    }

    /// Cells in [`SHEET_COLUMNS`] order.
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn fecha(&self) -> &str {
        &self.cells[0]
    }

    pub fn maquina(&self) -> &str {
        &self.cells[1]
    }

    pub fn patente(&self) -> &str {
        &self.cells[2]
    }

    pub fn folio(&self) -> &str {
        &self.cells[3]
    }
}

/// Normalise a single cell the way the sheet stores it.
pub fn normalize_cell(value: &str) -> String {
    let value = TRAILING_ZERO.replace(value, "");
    let value = WHITESPACE.replace_all(&value, " ");
    let value = value.trim();
    match value {
        "None" | "nan" => String::new(),
        other => other.to_string(),
    }
}

/// Normalise a percentage to `<number>%` with a decimal point.
///
/// Values that are neither numeric nor already suffixed are kept as-is.
pub fn normalize_percent(value: Option<&str>) -> String {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v.replace(',', ".").trim().to_string(),
        _ => return String::new(),
    };
    if value.ends_with('%') {
        return value;
    }
    if value.parse::<f64>().is_ok() {
        format!("{}%", value)
    } else {
        value
    }
}

/// Drop repeated rows, keeping the first occurrence of each.
pub fn dedup_rows(rows: Vec<SheetRow>) -> Vec<SheetRow> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.into_iter().filter(|r| seen.insert(r.clone())).collect()
}

/// Outcome of merging new rows into an existing sheet.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// Deduplicated rows, existing ones first.
    pub rows: Vec<SheetRow>,
    /// Row count of the existing sheet before merging.
    pub initial: usize,
}

impl MergeOutcome {
    /// Net rows added. Negative when the existing sheet itself held
    /// duplicates that were collapsed.
    pub fn added(&self) -> isize {
        self.rows.len() as isize - self.initial as isize
    }

    pub fn total(&self) -> usize {
        self.rows.len()
    }
}

/// Append `incoming` to `existing` and deduplicate by full-row equality.
pub fn merge_rows(existing: Vec<SheetRow>, incoming: Vec<SheetRow>) -> MergeOutcome {
    let initial = existing.len();
    let mut all = existing;
    all.extend(incoming);
    MergeOutcome {
        rows: dedup_rows(all),
        initial,
    }
}

/// Number of recorded laps per vehicle and machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapSummary {
    pub patente: String,
    pub maquina: String,
    pub total_vueltas: usize,
}

/// Count folios per (plate, machine), most laps first.
///
/// Groups are ordered by key before the count sort so ties come out in
/// plate/machine order.
pub fn lap_summary(rows: &[SheetRow]) -> Vec<LapSummary> {
    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for row in rows {
        *counts.entry((row.patente(), row.maquina())).or_default() += 1;
    }

    let mut summary: Vec<LapSummary> = counts
        .into_iter()
        .map(|((patente, maquina), total_vueltas)| LapSummary {
            patente: patente.to_string(),
            maquina: maquina.to_string(),
            total_vueltas,
        })
        .collect();
    summary.sort_by(|a, b| b.total_vueltas.cmp(&a.total_vueltas));
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(folio: &str, patente: &str, maquina: u32) -> SheetRow {
        let mut r = ExtractedRow::new("01-02-2024", folio);
        r.patente = Some(patente.to_string());
        r.maquina = Some(maquina);
        SheetRow::from_row(&r)
    }

    #[test]
    fn test_from_row_renders_empty_cells() {
        let r = ExtractedRow::new("01-02-2024", "123456789012");
        let sheet = SheetRow::from_row(&r);
        assert_eq!(sheet.fecha(), "01-02-2024");
        assert_eq!(sheet.folio(), "123456789012");
        assert_eq!(sheet.maquina(), "");
        assert_eq!(sheet.cells().len(), SHEET_COLUMNS.len());
    }

    #[test]
    fn test_normalize_cell() {
        assert_eq!(normalize_cell("12.0"), "12");
        assert_eq!(normalize_cell("  JUAN   PEREZ \n"), "JUAN PEREZ");
        assert_eq!(normalize_cell("None"), "");
        assert_eq!(normalize_cell("nan"), "");
    }

    #[test]
    fn test_normalize_percent() {
        assert_eq!(normalize_percent(Some("12,5%")), "12.5%");
        assert_eq!(normalize_percent(Some("12.50")), "12.50%");
        assert_eq!(normalize_percent(Some("n/a")), "n/a");
        assert_eq!(normalize_percent(None), "");
    }

    #[test]
    fn test_merge_with_itself_keeps_distinct_rows() {
        let rows = vec![row("111111111111", "ABCD12", 1), row("222222222222", "ABCD12", 1)];
        let outcome = merge_rows(rows.clone(), rows.clone());
        assert_eq!(outcome.total(), 2);
        assert_eq!(outcome.added(), 0);
        assert_eq!(outcome.rows, rows);
    }

    #[test]
    fn test_from_record_matches_rendered_row() {
        let original = row("111111111111", "ABCD12", 7);
        let values: Vec<String> = original.cells().to_vec();
        let read_back = SheetRow::from_record(&SHEET_COLUMNS, &values.iter().map(String::as_str).collect::<Vec<_>>()).unwrap();
        assert_eq!(read_back, original);
    }

    #[test]
    fn test_from_record_requires_folio() {
        let err = SheetRow::from_record(&["Fecha", "Patente"], &["01-02-2024", "ABCD12"]);
        assert!(matches!(err, Err(SheetError::MissingColumn(c)) if c == "Folio"));
    }

    #[test]
    fn test_lap_summary_counts_and_orders() {
        let rows = vec![
            row("111111111111", "BBBB22", 2),
            row("222222222222", "AAAA11", 1),
            row("333333333333", "BBBB22", 2),
        ];
        let summary = lap_summary(&rows);
        assert_eq!(
            summary,
            vec![
                LapSummary { patente: "BBBB22".into(), maquina: "2".into(), total_vueltas: 2 },
                LapSummary { patente: "AAAA11".into(), maquina: "1".into(), total_vueltas: 1 },
            ]
        );
    }
}
