//! Silver-layer price normalization.
//!
//! An ordered chain of pure stages over the combined raw rows:
//!
//!   1. canonical sort by (ticker, date)
//!   2. drop rows with every OHLC field missing
//!   3. partition into one ordered series per ticker
//!   4. forward-fill OHLC per ticker
//!   5. fill missing volume with the ticker's median volume
//!   6. reindex onto the Mon–Fri business-day calendar (own min..max)
//!   7. forward-fill OHLCV across the reindexed calendar
//!
//! Stage order matters: the pre-reindex fills (4, 5) see only observed rows,
//! so the volume median is never skewed by calendar-inserted days. Each stage
//! is exposed on its own so the order stays auditable and testable.

use crate::models::{PriceRecord, PriceSeries};
use chrono::{Datelike, NaiveDate, Weekday};
use tracing::debug;

/// Run the full chain. Input rows may arrive in any order; output is one
/// gap-free series per ticker, in ascending ticker order.
pub fn normalize(rows: Vec<PriceRecord>) -> Vec<PriceSeries> {
    let rows = sort_canonical(rows);
    let rows = drop_all_missing_rows(rows);

    partition_by_ticker(rows)
        .into_iter()
        .map(|mut series| {
            forward_fill_prices(&mut series.records);
            fill_volume_with_median(&mut series.records);
            let mut series = reindex_business_days(series);
            forward_fill_all(&mut series.records);
            series
        })
        .collect()
}

// ── Stages ────────────────────────────────────────────────────────────────────

/// Canonical (ticker, date) ascending order. Every later stage and the final
/// output iterate in this order.
pub fn sort_canonical(mut rows: Vec<PriceRecord>) -> Vec<PriceRecord> {
    rows.sort_by(|a, b| a.ticker.cmp(&b.ticker).then(a.date.cmp(&b.date)));
    rows
}

/// Drop rows where open, high, low and close are all missing at once. A row
/// with at least one present OHLC value survives.
pub fn drop_all_missing_rows(rows: Vec<PriceRecord>) -> Vec<PriceRecord> {
    let before = rows.len();
    let rows: Vec<PriceRecord> = rows.into_iter().filter(|r| !r.all_prices_missing()).collect();
    if rows.len() < before {
        debug!("Dropped {} all-missing OHLC rows", before - rows.len());
    }
    rows
}

/// Split canonically sorted rows into one series per ticker. Explicit
/// partition step: per-ticker stages never look across a boundary.
pub fn partition_by_ticker(rows: Vec<PriceRecord>) -> Vec<PriceSeries> {
    let mut partitions: Vec<PriceSeries> = Vec::new();

    for row in rows {
        let boundary = partitions
            .last()
            .is_none_or(|series| series.ticker != row.ticker);
        if boundary {
            partitions.push(PriceSeries {
                ticker: row.ticker.clone(),
                records: Vec::new(),
            });
        }
        if let Some(series) = partitions.last_mut() {
            series.records.push(row);
        }
    }

    partitions
}

/// Forward-fill open/high/low/close independently in date order. A leading
/// missing run stays missing: nothing is fabricated before the first real
/// observation.
pub fn forward_fill_prices(records: &mut [PriceRecord]) {
    let (mut open, mut high, mut low, mut close) = (None, None, None, None);

    for r in records.iter_mut() {
        match r.open {
            Some(v) => open = Some(v),
            None => r.open = open,
        }
        match r.high {
            Some(v) => high = Some(v),
            None => r.high = high,
        }
        match r.low {
            Some(v) => low = Some(v),
            None => r.low = low,
        }
        match r.close {
            Some(v) => close = Some(v),
            None => r.close = close,
        }
    }
}

/// Fill missing volume with the series' median volume, computed once over the
/// observed (pre-reindex) rows. A series with no volume at all stays missing.
pub fn fill_volume_with_median(records: &mut [PriceRecord]) {
    let mut observed: Vec<f64> = records.iter().filter_map(|r| r.volume).collect();
    let Some(median) = median(&mut observed) else {
        return;
    };

    for r in records.iter_mut() {
        if r.volume.is_none() {
            r.volume = Some(median);
        }
    }
}

/// Interpolated median: mean of the two middle values for even counts.
fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// Reindex one series onto the business days spanning its own observed
/// min..max date. Days absent from the source become all-null placeholder
/// rows; observed rows falling outside the calendar (weekends) are dropped:
/// the calendar is authoritative.
pub fn reindex_business_days(series: PriceSeries) -> PriceSeries {
    let Some(first) = series.records.first() else {
        return series;
    };
    let start = first.date;
    let end = series.records.last().map_or(start, |r| r.date);

    let mut records = Vec::new();
    let mut observed = series.records.into_iter().peekable();

    for day in business_days(start, end) {
        while observed.next_if(|r| r.date < day).is_some() {}
        match observed.next_if(|r| r.date == day) {
            Some(row) => records.push(row),
            None => records.push(PriceRecord::gap_filler(&series.ticker, day)),
        }
    }

    PriceSeries {
        ticker: series.ticker,
        records,
    }
}

/// Forward-fill OHLC and volume. Used after reindexing so calendar-inserted
/// rows inherit the prior day's values.
pub fn forward_fill_all(records: &mut [PriceRecord]) {
    forward_fill_prices(records);

    let mut volume = None;
    for r in records.iter_mut() {
        match r.volume {
            Some(v) => volume = Some(v),
            None => r.volume = volume,
        }
    }
}

// ── Calendar ──────────────────────────────────────────────────────────────────

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Every weekday in [start, end], ascending.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        if is_business_day(day) {
            days.push(day);
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    days
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(ticker: &str, date: NaiveDate, close: Option<f64>, volume: Option<f64>) -> PriceRecord {
        PriceRecord {
            ticker: ticker.to_string(),
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    #[test]
    fn business_days_skip_weekends() {
        // Fri 2024-01-05 .. Tue 2024-01-09
        let days = business_days(d(2024, 1, 5), d(2024, 1, 9));
        assert_eq!(days, vec![d(2024, 1, 5), d(2024, 1, 8), d(2024, 1, 9)]);
    }

    #[test]
    fn partition_preserves_canonical_order() {
        let rows = sort_canonical(vec![
            row("MSFT", d(2024, 1, 3), Some(1.0), None),
            row("AAPL", d(2024, 1, 3), Some(2.0), None),
            row("AAPL", d(2024, 1, 2), Some(3.0), None),
        ]);
        let parts = partition_by_ticker(rows);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].ticker, "AAPL");
        assert_eq!(parts[0].records[0].date, d(2024, 1, 2));
        assert_eq!(parts[1].ticker, "MSFT");
    }

    #[test]
    fn all_missing_rows_dropped_partial_rows_kept() {
        let mut all_missing = row("AAPL", d(2024, 1, 2), None, Some(100.0));
        all_missing.open = None;
        let mut partial = row("AAPL", d(2024, 1, 3), None, None);
        partial.high = Some(5.0);

        let rows = drop_all_missing_rows(vec![all_missing, partial.clone()]);
        assert_eq!(rows, vec![partial]);
    }

    #[test]
    fn forward_fill_keeps_leading_gap() {
        let mut records = vec![
            row("AAPL", d(2024, 1, 2), None, None),
            row("AAPL", d(2024, 1, 3), Some(10.0), None),
            row("AAPL", d(2024, 1, 4), None, None),
        ];
        // keep one field present so the row is realistic post-drop
        records[0].high = Some(9.0);

        forward_fill_prices(&mut records);
        assert_eq!(records[0].close, None, "leading gap must not be fabricated");
        assert_eq!(records[2].close, Some(10.0));
        assert_eq!(records[2].high, Some(10.0));
    }

    #[test]
    fn median_volume_fill_is_interpolated() {
        let mut records = vec![
            row("AAPL", d(2024, 1, 2), Some(1.0), Some(100.0)),
            row("AAPL", d(2024, 1, 3), Some(1.0), None),
            row("AAPL", d(2024, 1, 4), Some(1.0), Some(300.0)),
            row("AAPL", d(2024, 1, 5), Some(1.0), Some(200.0)),
            row("AAPL", d(2024, 1, 8), Some(1.0), Some(400.0)),
        ];
        fill_volume_with_median(&mut records);
        // even count of observed volumes: (200 + 300) / 2
        assert_eq!(records[1].volume, Some(250.0));
    }

    #[test]
    fn reindex_inserts_calendar_gap_days() {
        let series = PriceSeries {
            ticker: "AAPL".into(),
            records: vec![
                row("AAPL", d(2024, 1, 2), Some(10.0), Some(100.0)),
                // 2024-01-03 missing from the source
                row("AAPL", d(2024, 1, 4), Some(11.0), Some(110.0)),
            ],
        };
        let series = reindex_business_days(series);
        let dates: Vec<NaiveDate> = series.records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(2024, 1, 2), d(2024, 1, 3), d(2024, 1, 4)]);
        assert_eq!(series.records[1].close, None);
        assert_eq!(series.records[1].ticker, "AAPL");
    }

    #[test]
    fn single_observation_stays_single_row() {
        let series = PriceSeries {
            ticker: "AAPL".into(),
            records: vec![row("AAPL", d(2024, 1, 2), Some(10.0), Some(1.0))],
        };
        let series = reindex_business_days(series);
        assert_eq!(series.records.len(), 1);
    }

    #[test]
    fn weekend_observations_are_dropped_by_the_calendar() {
        let series = PriceSeries {
            ticker: "AAPL".into(),
            records: vec![
                row("AAPL", d(2024, 1, 5), Some(10.0), None), // Fri
                row("AAPL", d(2024, 1, 6), Some(99.0), None), // Sat
                row("AAPL", d(2024, 1, 8), Some(11.0), None), // Mon
            ],
        };
        let series = reindex_business_days(series);
        let closes: Vec<Option<f64>> = series.records.iter().map(|r| r.close).collect();
        assert_eq!(closes, vec![Some(10.0), Some(11.0)]);
    }

    #[test]
    fn full_chain_fills_inserted_days_and_preserves_leading_nulls() {
        let rows = vec![
            // leading day with only volume-bearing partial data
            PriceRecord {
                ticker: "AAPL".into(),
                date: d(2024, 1, 2),
                open: None,
                high: Some(9.0),
                low: None,
                close: None,
                volume: None,
            },
            row("AAPL", d(2024, 1, 3), Some(10.0), Some(100.0)),
            // 2024-01-04 absent from the source
            row("AAPL", d(2024, 1, 5), Some(12.0), Some(200.0)),
        ];

        let series = normalize(rows);
        assert_eq!(series.len(), 1);
        let records = &series[0].records;
        // Jan 2 (Tue) .. Jan 5 (Fri), Jan 4 inserted by the reindex
        assert_eq!(records.len(), 4);

        // leading close stays null through both fill passes
        assert_eq!(records[0].close, None);
        // but its volume got the observed median
        assert_eq!(records[0].volume, Some(150.0));
        // inserted day forward-filled from Jan 3
        assert_eq!(records[2].date, d(2024, 1, 4));
        assert_eq!(records[2].close, Some(10.0));
        assert_eq!(records[2].volume, Some(100.0));
        assert_eq!(records[2].ticker, "AAPL");
    }
}
