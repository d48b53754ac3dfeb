//! Silver-layer output. Both curated tables are staged as temp files and
//! renamed into place only after both serialize cleanly, so a failed run
//! never leaves one table from this run next to the other from the last.

use crate::models::{FeatureRecord, Transaction};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const PRICE_HEADER: [&str; 12] = [
    "Date",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "Stock",
    "Daily_Return",
    "Cumulative_Return",
    "MA_20",
    "MA_50",
    "Normalized_Close",
];

const TRANSACTION_HEADER: [&str; 5] = ["Trade_Date", "Stock", "Trade_Type", "Quantity", "Price"];

/// Write both curated tables under `processed_dir`, overwriting previous runs.
pub fn write_outputs(
    processed_dir: &Path,
    price_file: &str,
    transactions_file: &str,
    prices: &[FeatureRecord],
    transactions: &[Transaction],
) -> Result<()> {
    fs::create_dir_all(processed_dir)
        .with_context(|| format!("create output dir {processed_dir:?}"))?;

    let price_path = processed_dir.join(price_file);
    let tx_path = processed_dir.join(transactions_file);

    let price_tmp = staged(&price_path);
    let tx_tmp = staged(&tx_path);

    write_csv(&price_tmp, &PRICE_HEADER, prices)?;
    write_csv(&tx_tmp, &TRANSACTION_HEADER, transactions)?;

    // both staged successfully; commit
    fs::rename(&price_tmp, &price_path)
        .with_context(|| format!("commit {price_path:?}"))?;
    fs::rename(&tx_tmp, &tx_path).with_context(|| format!("commit {tx_path:?}"))?;

    info!(
        "Wrote {} price rows to {:?} and {} transactions to {:?}",
        prices.len(),
        price_path,
        transactions.len(),
        tx_path
    );
    Ok(())
}

fn staged(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Header written explicitly so an empty table still carries its schema.
fn write_csv<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("create {path:?}"))?;

    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().with_context(|| format!("flush {path:?}"))?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
