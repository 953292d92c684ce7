//! CSV form of the data sheet and the lap summary.

use std::path::Path;

use anyhow::Context;

use tripsheet_core::models::sheet::{SHEET_COLUMNS, SUMMARY_COLUMNS};
use tripsheet_core::{LapSummary, SheetRow};

/// Read a previously written sheet. Columns are matched by header name.
pub fn read_sheet(path: &Path) -> anyhow::Result<Vec<SheetRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open sheet {}", path.display()))?;

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let values: Vec<String> = record?.iter().map(str::to_string).collect();
        rows.push(SheetRow::from_record(&headers, &values)?);
    }
    Ok(rows)
}

pub fn write_sheet(path: &Path, rows: &[SheetRow]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create sheet {}", path.display()))?;

    wtr.write_record(SHEET_COLUMNS)?;
    for row in rows {
        wtr.write_record(row.cells())?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_summary(path: &Path, summary: &[LapSummary]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create summary {}", path.display()))?;

    wtr.write_record(SUMMARY_COLUMNS)?;
    for entry in summary {
        wtr.write_record([
            entry.patente.as_str(),
            entry.maquina.as_str(),
            &entry.total_vueltas.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripsheet_core::ExtractedRow;

    #[test]
    fn test_sheet_round_trip_normalises() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.csv");

        let mut row = ExtractedRow::new("01-02-2024", "123456789012");
        row.maquina = Some(12);
        row.porcentaje = Some("12.5%".to_string());
        let rows = vec![SheetRow::from_row(&row)];

        write_sheet(&path, &rows).unwrap();
        assert_eq!(read_sheet(&path).unwrap(), rows);
    }

    #[test]
    fn test_read_sheet_with_foreign_float_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.csv");
        std::fs::write(&path, "Folio,Maquina,%,Extra\n123456789012.0,7.0,\"80,5\",x\n").unwrap();

        let rows = read_sheet(&path).unwrap();
        assert_eq!(rows[0].folio(), "123456789012");
        assert_eq!(rows[0].maquina(), "7");
        assert_eq!(rows[0].cells()[10], "80.5%");
    }

    #[test]
    fn test_read_sheet_requires_folio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.csv");
        std::fs::write(&path, "Fecha,Maquina\n01-02-2024,1\n").unwrap();
        assert!(read_sheet(&path).is_err());
    }
}
