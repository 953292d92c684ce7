//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod process;
mod sheet;

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use tripsheet_core::TripsheetConfig;

/// `<config dir>/tripsheet/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripsheet")
        .join("config.json")
}

/// Configuration from an explicit path, else the default file when it
/// exists, else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<TripsheetConfig> {
    if let Some(path) = config_path {
        return TripsheetConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to read config {}", path));
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config {}", default_path.display());
        return TripsheetConfig::from_file(&default_path)
            .with_context(|| format!("Failed to read config {}", default_path.display()));
    }

    Ok(TripsheetConfig::default())
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}
