//! Portfolio transaction-log sanitation, independent of the price pipeline.
//!
//! Unlike the price path this side never aborts on bad data: unparseable
//! dates and numbers coerce to null, and the missing-field filter drops the
//! row. No cross-check against the price ticker universe is performed.

use crate::loader::{parse_date, parse_number};
use crate::models::{RawTransactionRow, TradeType, Transaction};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizeStats {
    pub kept: usize,
    pub dropped: usize,
}

/// Apply every filter in order; only rows passing all of them survive:
///   1. trade_type must be exactly "BUY" or "SELL" (case-sensitive)
///   2. trade_date parses (coerced: failures become null, never fatal)
///   3. no missing field among date, ticker, quantity, price
///   4. quantity > 0 and price > 0 (strict)
pub fn sanitize(rows: Vec<RawTransactionRow>) -> (Vec<Transaction>, SanitizeStats) {
    let total = rows.len();
    let mut kept = Vec::new();

    for (i, row) in rows.into_iter().enumerate() {
        match sanitize_row(&row) {
            Some(tx) => kept.push(tx),
            None => debug!("Dropped transaction row {}: {:?}", i + 1, row),
        }
    }

    let stats = SanitizeStats {
        kept: kept.len(),
        dropped: total - kept.len(),
    };
    info!(
        "Transactions: {} kept, {} dropped of {}",
        stats.kept, stats.dropped, total
    );
    (kept, stats)
}

fn sanitize_row(row: &RawTransactionRow) -> Option<Transaction> {
    let trade_type = TradeType::parse(row.trade_type.as_deref()?)?;

    // coerced parses: a failure is a null, caught by the `?` below
    let trade_date = row.trade_date.as_deref().and_then(parse_date)?;
    let ticker = row.ticker.as_deref()?.to_string();
    let quantity = coerce_number(row.quantity.as_deref())?;
    let price = coerce_number(row.price.as_deref())?;

    if quantity <= 0.0 || price <= 0.0 {
        return None;
    }

    Some(Transaction {
        trade_date,
        ticker,
        trade_type,
        quantity,
        price,
    })
}

fn coerce_number(s: Option<&str>) -> Option<f64> {
    parse_number(s?).ok().flatten()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
