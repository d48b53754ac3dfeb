//! Pre-flight input checks. Runs before any transformation so a missing file
//! fails the whole run with nothing half-written.

use crate::config::AppConfig;
use crate::error::EtlError;
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Required columns of each per-ticker price file.
pub const PRICE_COLUMNS: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

/// Required columns of the portfolio transaction file.
pub const TRANSACTION_COLUMNS: [&str; 5] = ["Trade_Date", "Stock", "Trade_Type", "Quantity", "Price"];

/// The fixed set of files one run consumes.
#[derive(Debug, Clone)]
pub struct RequiredInputs {
    /// (ticker label, path) pairs, in configured ticker order.
    pub price_files: Vec<(String, PathBuf)>,
    pub transactions_file: PathBuf,
}

impl RequiredInputs {
    pub fn from_config(config: &AppConfig) -> Self {
        let price_files = config
            .pipeline
            .tickers
            .iter()
            .map(|t| {
                (
                    t.clone(),
                    config.data.raw_stock_dir.join(format!("{t}.csv")),
                )
            })
            .collect();

        Self {
            price_files,
            transactions_file: config
                .data
                .raw_portfolio_dir
                .join(&config.pipeline.transactions_file),
        }
    }

    /// Fail fast on the first absent file. No side effects.
    pub fn check_exists(&self) -> Result<(), EtlError> {
        for (ticker, path) in &self.price_files {
            debug!("Checking {} input at {:?}", ticker, path);
            if !path.is_file() {
                return Err(EtlError::MissingInput(path.clone()));
            }
        }
        if !self.transactions_file.is_file() {
            return Err(EtlError::MissingInput(self.transactions_file.clone()));
        }
        Ok(())
    }
}

/// Verify a header row carries every required column (exact names).
pub fn check_columns(
    file: &str,
    headers: &csv::StringRecord,
    required: &[&str],
) -> Result<(), EtlError> {
    for col in required {
        if !headers.iter().any(|h| h == *col) {
            return Err(EtlError::Schema {
                file: file.to_string(),
                reason: format!("required column {col:?} not found"),
            });
        }
    }
    Ok(())
}

/// Open a CSV file and verify its header row carries `required`.
pub fn check_file_columns(path: &Path, required: &[&str]) -> anyhow::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("open {path:?}"))?;
    let headers = reader.headers()?.clone();
    check_columns(&file_name, &headers, required)?;
    Ok(())
}

/// Index of a required column within a header row.
pub fn column_index(
    file: &str,
    headers: &csv::StringRecord,
    name: &str,
) -> Result<usize, EtlError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| EtlError::Schema {
            file: file.to_string(),
            reason: format!("required column {name:?} not found"),
        })
}
