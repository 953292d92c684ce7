//! Assemble one row from one candidate block.

use tracing::trace;

use super::anchors::{anchor_blocks, first_anchor};
use super::rules::{
    reconstruct_plate, split_driver_counters, take_folio, take_machine, take_percent_pair,
    take_variant_frequency,
};
use super::tokens::{normalize_space, tokenize};
use crate::models::row::ExtractedRow;

/// Parse the text following an anchor into a row.
///
/// Fields are taken left to right: machine, plate, folio, variant and
/// frequency, then driver and counters from what remains, then the
/// percentage and event pair. Returns `None` when the date or folio is
/// missing; every other field is optional.
pub fn parse_block(block: &str, fecha: &str, hora: Option<&str>) -> Option<ExtractedRow> {
    if fecha.trim().is_empty() {
        return None;
    }

    let tokens = tokenize(block);

    let (maquina, pos) = take_machine(&tokens, 0);
    let (patente, pos) = reconstruct_plate(&tokens, pos);
    let (folio, pos) = take_folio(&tokens, pos);
    let Some(folio) = folio else {
        trace!("rejecting block without folio: {:?}", block);
        return None;
    };
    let (variante, frecuencia, pos) = take_variant_frequency(&tokens, pos);

    let rest = tokens.get(pos..).unwrap_or_default().join(" ");
    let driver = split_driver_counters(&rest);
    let tail = take_percent_pair(driver.tail);

    let row = ExtractedRow {
        fecha: fecha.to_string(),
        hora: hora.map(str::to_string),
        maquina,
        patente,
        folio,
        variante,
        frecuencia,
        conductor: driver.conductor,
        ab: driver.ab,
        sd: driver.sd,
        ci: driver.ci,
        porcentaje: tail.porcentaje,
        ev: tail.ev,
        te: tail.te,
    };

    row.is_valid().then_some(row)
}

/// Scan free text for anchors and parse the block after each one.
pub fn parse_text(text: &str) -> Vec<ExtractedRow> {
    anchor_blocks(text)
        .into_iter()
        .filter_map(|(anchor, block)| parse_block(block, &anchor.fecha, anchor.hora.as_deref()))
        .collect()
}

/// Parse one table row: cells are joined, the first anchor located and the
/// text after it parsed. Rows without an anchor are headers or noise.
pub fn parse_table_row<S: AsRef<str>>(cells: &[S]) -> Option<ExtractedRow> {
    let joined = cells.iter().map(|c| c.as_ref()).collect::<Vec<&str>>().join(" ");
    let line = normalize_space(&joined);
    let anchor = first_anchor(&line)?;
    parse_block(&line[anchor.end..], &anchor.fecha, anchor.hora.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_block() {
        let row = parse_block(
            " 12 ABCD12 123456789012 101 5 JUAN PEREZ 10|2|3 12,5% 4|1",
            "01-02-2024",
            Some("06:30:00"),
        )
        .unwrap();

        let mut expected = ExtractedRow::new("01-02-2024", "123456789012");
        expected.hora = Some("06:30:00".to_string());
        expected.maquina = Some(12);
        expected.patente = Some("ABCD12".to_string());
        expected.variante = Some(101);
        expected.frecuencia = Some(5);
        expected.conductor = Some("JUAN PEREZ".to_string());
        expected.ab = Some(10);
        expected.sd = Some(2);
        expected.ci = Some(3);
        expected.porcentaje = Some("12.5%".to_string());
        expected.ev = Some(4);
        expected.te = Some(1);
        assert_eq!(row, expected);
    }

    #[test]
    fn test_parse_wrapped_block() {
        let block = "\n 7  AB CD\n 12 1234567\n89012 205 3\nMARIA\nSOTO 1 | 0 | 2  90%";
        let row = parse_block(block, "01/02/2024", None).unwrap();
        assert_eq!(row.maquina, Some(7));
        assert_eq!(row.patente.as_deref(), Some("ABCD12"));
        assert_eq!(row.folio, "123456789012");
        assert_eq!(row.variante, Some(205));
        assert_eq!(row.frecuencia, Some(3));
        assert_eq!(row.conductor.as_deref(), Some("MARIA SOTO"));
        assert_eq!(row.porcentaje.as_deref(), Some("90%"));
        assert_eq!((row.ev, row.te), (None, None));
    }

    #[test]
    fn test_block_without_folio_rejected() {
        assert_eq!(parse_block(" 12 ABCD12 101 5 JUAN", "01-02-2024", None), None);
    }

    #[test]
    fn test_block_without_date_rejected() {
        assert_eq!(parse_block(" 12 ABCD12 123456789012", "", None), None);
    }

    #[test]
    fn test_minimal_block() {
        let row = parse_block("123456789012", "01-02-2024", None).unwrap();
        assert_eq!(row, ExtractedRow::new("01-02-2024", "123456789012"));
    }

    #[test]
    fn test_parse_text_multiple_records() {
        let text = "REPORTE DE VUELTAS\n\
            01-02-2024 06:30:00 1 ABCD12 111111111111 101 5 JUAN 1|2|3 50% 1|0\n\
            01-02-2024\n07:10:00 2 WXYZ98 222222222222 102 6 PEDRO 4|5|6 75,25% 2|1\n\
            01-02-2024 08:00:00 sin folio\n";
        let rows = parse_text(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].folio, "111111111111");
        assert_eq!(rows[1].hora.as_deref(), Some("07:10:00"));
        assert_eq!(rows[1].patente.as_deref(), Some("WXYZ98"));
        assert_eq!(rows[1].porcentaje.as_deref(), Some("75.25%"));
        assert!(rows.iter().all(ExtractedRow::is_valid));
    }

    #[test]
    fn test_parse_table_row() {
        let cells = ["01-02-2024\n06:30:00", "12", "ABCD12", "123456789012", "", "JUAN"];
        let row = parse_table_row(&cells).unwrap();
        assert_eq!(row.hora.as_deref(), Some("06:30:00"));
        assert_eq!(row.maquina, Some(12));
        assert_eq!(row.conductor.as_deref(), Some("JUAN"));
    }

    #[test]
    fn test_table_header_row_skipped() {
        let cells = ["Fecha", "Maquina", "Patente", "Folio"];
        assert_eq!(parse_table_row(&cells), None);
    }
}
