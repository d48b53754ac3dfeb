//! CSV readers for the raw (Bronze) inputs.
//!
//! Two parsing regimes, on purpose:
//!   * price files: strict. A date that parses as nothing aborts the run
//!     (`DateParse`), a non-numeric price cell is a `Schema` error.
//!   * transaction file: tolerant. Every field comes out as an opaque string;
//!     the sanitizer coerces and filters downstream.

use crate::error::EtlError;
use crate::models::{PriceRecord, RawTransactionRow};
use crate::validation::{check_columns, column_index, PRICE_COLUMNS, TRANSACTION_COLUMNS};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;
use tracing::{debug, info};

// ── Parsers ───────────────────────────────────────────────────────────────────

/// Tokens treated as an absent value in any cell.
fn is_missing_token(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s == "NA" || s == "N/A" || s == "NaN" || s == "nan" || s == "null" || s == "-"
}

/// Parse dates: ISO first, then the usual export formats.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%d/%m/%Y") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%b %d, %Y") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%d %b %Y") {
        return Some(d);
    }

    None
}

/// Parse a numeric cell: thousands separators stripped, missing tokens → None.
/// "1,234.56" → Some(1234.56) | "" → None | "abc" → Err (caller decides).
pub fn parse_number(s: &str) -> Result<Option<f64>, ()> {
    if is_missing_token(s) {
        return Ok(None);
    }
    let cleaned = s.trim().replace(',', "");
    cleaned.parse::<f64>().map(Some).map_err(|_| ())
}

// ── Price files ───────────────────────────────────────────────────────────────

/// Load one per-ticker price file, tagging every row with the externally
/// supplied ticker label (file contents never decide the label).
pub fn load_price_file(path: &Path, ticker: &str) -> Result<Vec<PriceRecord>> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Loading {} from {:?}", ticker, path);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open price file {path:?}"))?;

    let headers = reader.headers()?.clone();
    check_columns(&file_name, &headers, &PRICE_COLUMNS)?;

    let date_idx = column_index(&file_name, &headers, "Date")?;
    let open_idx = column_index(&file_name, &headers, "Open")?;
    let high_idx = column_index(&file_name, &headers, "High")?;
    let low_idx = column_index(&file_name, &headers, "Low")?;
    let close_idx = column_index(&file_name, &headers, "Close")?;
    let volume_idx = column_index(&file_name, &headers, "Volume")?;

    let mut rows = Vec::new();

    for (i, result) in reader.records().enumerate() {
        // header is line 1
        let line = i + 2;
        let record = result.with_context(|| format!("{file_name} line {line}"))?;

        let date_str = record.get(date_idx).unwrap_or("").trim();
        let date = parse_date(date_str).ok_or_else(|| EtlError::DateParse {
            file: file_name.clone(),
            line,
            value: date_str.to_string(),
        })?;

        let number = |idx: usize, col: &str| -> Result<Option<f64>, EtlError> {
            let cell = record.get(idx).unwrap_or("");
            parse_number(cell).map_err(|_| EtlError::Schema {
                file: file_name.clone(),
                reason: format!("non-numeric {col} value {cell:?} at line {line}"),
            })
        };

        rows.push(PriceRecord {
            ticker: ticker.to_string(),
            date,
            open: number(open_idx, "Open")?,
            high: number(high_idx, "High")?,
            low: number(low_idx, "Low")?,
            close: number(close_idx, "Close")?,
            volume: number(volume_idx, "Volume")?,
        });
    }

    info!("{}: {} raw rows loaded", ticker, rows.len());
    Ok(rows)
}

// ── Transaction file ──────────────────────────────────────────────────────────

/// Load the raw transaction log. No parsing beyond CSV structure; empty cells
/// become `None` so the sanitizer's missing-field filter sees them.
pub fn load_transactions(path: &Path) -> Result<Vec<RawTransactionRow>> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open transaction file {path:?}"))?;

    let headers = reader.headers()?.clone();
    check_columns(&file_name, &headers, &TRANSACTION_COLUMNS)?;

    let date_idx = column_index(&file_name, &headers, "Trade_Date")?;
    let stock_idx = column_index(&file_name, &headers, "Stock")?;
    let type_idx = column_index(&file_name, &headers, "Trade_Type")?;
    let qty_idx = column_index(&file_name, &headers, "Quantity")?;
    let price_idx = column_index(&file_name, &headers, "Price")?;

    let cell = |record: &csv::StringRecord, idx: usize| -> Option<String> {
        let s = record.get(idx)?.trim();
        if s.is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    };

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("{} line {}", file_name, i + 2))?;
        rows.push(RawTransactionRow {
            trade_date: cell(&record, date_idx),
            ticker: cell(&record, stock_idx),
            trade_type: cell(&record, type_idx),
            quantity: cell(&record, qty_idx),
            price: cell(&record, price_idx),
        });
    }

    info!("{} raw transaction rows loaded", rows.len());
    Ok(rows)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
