//! Process command - extract the rows of a single report.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use tripsheet_core::{Extraction, Extractor};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Fall back to OCR when no text rows are found
    #[arg(long)]
    ocr: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    if args.ocr {
        config.extraction.use_ocr = true;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if !super::is_pdf(&args.input) {
        anyhow::bail!("Unsupported file format: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Extracting rows...");

    let extractor = Extractor::new(&config);
    let extraction = extractor
        .extract_file(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    pb.finish_and_clear();

    eprintln!(
        "{} Method: {}, {} rows, per page: {:?}",
        style("ℹ").blue(),
        extraction.method,
        extraction.rows.len(),
        extraction.rows_per_page
    );

    let output = format_extraction(&extraction, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn format_extraction(extraction: &Extraction, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(extraction)?),
        OutputFormat::Csv => format_csv(extraction),
        OutputFormat::Text => Ok(format_text(extraction)),
    }
}

fn format_csv(extraction: &Extraction) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in &extraction.rows {
        wtr.serialize(row)?;
    }
    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(extraction: &Extraction) -> String {
    let mut output = format!(
        "Method: {}\nRows: {}\n",
        extraction.method,
        extraction.rows.len()
    );

    for row in &extraction.rows {
        output.push_str(&format!(
            "\n{} {}  folio {}\n",
            row.fecha,
            row.hora.as_deref().unwrap_or("--:--:--"),
            row.folio
        ));
        if let Some(maquina) = row.maquina {
            output.push_str(&format!("  Machine: {}\n", maquina));
        }
        if let Some(patente) = &row.patente {
            output.push_str(&format!("  Plate:   {}\n", patente));
        }
        if let Some(conductor) = &row.conductor {
            output.push_str(&format!("  Driver:  {}\n", conductor));
        }
        if let Some(porcentaje) = &row.porcentaje {
            output.push_str(&format!("  Percent: {}\n", porcentaje));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripsheet_core::ExtractedRow;
    use tripsheet_core::ExtractionMethod;

    fn extraction() -> Extraction {
        let mut row = ExtractedRow::new("01-02-2024", "123456789012");
        row.hora = Some("06:30:00".to_string());
        row.maquina = Some(12);
        Extraction {
            rows: vec![row],
            rows_per_page: vec![1],
            method: ExtractionMethod::TextTables,
        }
    }

    #[test]
    fn test_csv_uses_row_headers() {
        let csv = format_csv(&extraction()).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("Fecha,Hora,Máquina,Patente,Folio"));
        assert!(lines.next().unwrap().starts_with("01-02-2024,06:30:00,12,,123456789012"));
    }

    #[test]
    fn test_text_summary() {
        let text = format_text(&extraction());
        assert!(text.starts_with("Method: text (tables)\nRows: 1\n"));
        assert!(text.contains("  Machine: 12\n"));
    }

    #[test]
    fn test_json_carries_method() {
        let json = format_extraction(&extraction(), OutputFormat::Json).unwrap();
        assert!(json.contains("\"method\": \"text_tables\""));
    }
}
