//! Batch command - consolidate many reports into one sheet.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};

use tripsheet_core::models::sheet::{lap_summary, merge_rows, DATA_SHEET, SUMMARY_SHEET};
use tripsheet_core::{Extractor, SheetRow};

use super::sheet::{read_sheet, write_sheet, write_summary};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Sheet to write (CSV)
    #[arg(short, long)]
    output: PathBuf,

    /// Merge into the existing sheet instead of replacing it
    #[arg(long)]
    append: bool,

    /// Fall back to OCR when no text rows are found
    #[arg(long)]
    ocr: bool,

    /// Also write the lap summary to this CSV
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    if args.ocr {
        config.extraction.use_ocr = true;
    }

    let files = expand_inputs(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No PDF files found for: {}", args.inputs.join(" "));
    }

    let existing = if args.append {
        if !args.output.exists() {
            anyhow::bail!(
                "Sheet to append to not found: {}",
                args.output.display()
            );
        }
        let rows = read_sheet(&args.output)?;
        info!("Read {} existing rows from {}", rows.len(), args.output.display());
        rows
    } else {
        Vec::new()
    };

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let extractor = Extractor::new(&config);
    let mut incoming = Vec::new();
    let mut failed: Vec<(PathBuf, String)> = Vec::new();

    for path in &files {
        match extractor.extract_file(path) {
            Ok(extraction) => {
                debug!(
                    "{}: {} rows via {}",
                    path.display(),
                    extraction.rows.len(),
                    extraction.method
                );
                if extraction.is_empty() {
                    warn!("No rows found in {}", path.display());
                }
                incoming.extend(extraction.rows.iter().map(SheetRow::from_row));
            }
            Err(e) => {
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), e);
                    failed.push((path.clone(), e.to_string()));
                } else {
                    error!("Failed to process {}: {}", path.display(), e);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), e);
                }
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    let outcome = merge_rows(existing, incoming);
    if outcome.rows.is_empty() {
        println!(
            "{} No rows extracted, {} left untouched",
            style("ℹ").blue(),
            args.output.display()
        );
        report_failures(&failed);
        return Ok(());
    }

    write_sheet(&args.output, &outcome.rows)?;
    println!(
        "{} Sheet {} written to {}",
        style("✓").green(),
        DATA_SHEET,
        args.output.display()
    );

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &lap_summary(&outcome.rows))?;
        println!(
            "{} Sheet {} written to {}",
            style("✓").green(),
            SUMMARY_SHEET,
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        files.len(),
        start.elapsed()
    );
    println!(
        "   Rows added: {}, total: {}",
        style(outcome.added()).green(),
        outcome.total()
    );

    report_failures(&failed);

    Ok(())
}

fn report_failures(failed: &[(PathBuf, String)]) {
    if failed.is_empty() {
        return;
    }
    println!();
    println!("{} {} failed", style("✗").red(), failed.len());
    for (path, error) in failed {
        println!("  - {}: {}", path.display(), error);
    }
}

/// Expand glob patterns and plain paths into PDF files, first occurrence
/// order, without repeats.
fn expand_inputs(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    for input in inputs {
        let matches: Vec<PathBuf> = if input.contains(['*', '?', '[']) {
            glob(input)?.filter_map(|r| r.ok()).collect()
        } else {
            vec![PathBuf::from(input)]
        };
        for path in matches {
            if super::is_pdf(&path) && path.is_file() && !files.contains(&path) {
                files.push(path);
            }
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_inputs() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.pdf", "b.PDF", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let pattern = format!("{}/*", dir.path().display());
        let explicit = dir.path().join("a.pdf").display().to_string();

        let files = expand_inputs(&[explicit, pattern]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.PDF"]);
    }

    #[test]
    fn test_expand_missing_file() {
        let files = expand_inputs(&["/definitely/not/here.pdf".to_string()]).unwrap();
        assert!(files.is_empty());
    }
}
