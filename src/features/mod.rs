//! Derived analytic columns, computed per ticker over the normalized series.
//!
//! Every computation is confined to one ticker: returns reset at the first
//! row of each series and a moving-average window never reads a neighbouring
//! ticker's closes. Null handling follows the cumulative-sum-with-nulls rule
//! documented on [`cumulative_returns`].

use crate::models::{FeatureRecord, PriceSeries};

/// Derive features for every series and concatenate in the canonical
/// (ticker, date) order the normalizer established.
pub fn assemble(series: &[PriceSeries]) -> Vec<FeatureRecord> {
    series.iter().flat_map(compute).collect()
}

/// Full feature set for one ticker's series.
pub fn compute(series: &PriceSeries) -> Vec<FeatureRecord> {
    let closes: Vec<Option<f64>> = series.records.iter().map(|r| r.close).collect();

    let daily = daily_returns(&closes);
    let cumulative = cumulative_returns(&daily);
    let ma_20 = moving_average(&closes, 20);
    let ma_50 = moving_average(&closes, 50);
    let normalized = min_max_normalize(&closes);

    series
        .records
        .iter()
        .enumerate()
        .map(|(i, r)| FeatureRecord {
            date: r.date,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            volume: r.volume,
            ticker: r.ticker.clone(),
            daily_return: daily[i],
            cumulative_return: cumulative[i],
            ma_20: ma_20[i],
            ma_50: ma_50[i],
            normalized_close: normalized[i],
        })
        .collect()
}

// ── Column computations ───────────────────────────────────────────────────────

/// `close[t] / close[t-1] - 1`. Null at the first row (no prior close) and
/// wherever either close is undefined.
pub fn daily_returns(closes: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    let mut prev: Option<f64> = None;

    for close in closes {
        out.push(match (prev, close) {
            (Some(p), Some(c)) => Some(c / p - 1.0),
            _ => None,
        });
        prev = *close;
    }

    out
}

/// Running sum of daily returns. A null daily return yields a null cumulative
/// value at that position but does not poison later sums: the accumulator
/// simply skips undefined periods.
pub fn cumulative_returns(returns: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut acc = 0.0;
    returns
        .iter()
        .map(|r| {
            r.map(|v| {
                acc += v;
                acc
            })
        })
        .collect()
}

/// Trailing simple moving average over exactly `window` observations,
/// inclusive of the current row. Null with insufficient history or when any
/// close in the window is undefined.
pub fn moving_average(closes: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    closes
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < window {
                return None;
            }
            let tail = &closes[i + 1 - window..=i];
            let mut sum = 0.0;
            for close in tail {
                sum += (*close)?;
            }
            Some(sum / window as f64)
        })
        .collect()
}

/// `(close - min) / (max - min)` over the series' defined closes. All-null
/// when the range is degenerate (max == min) or no close is defined.
pub fn min_max_normalize(closes: &[Option<f64>]) -> Vec<Option<f64>> {
    let defined = closes.iter().flatten();
    let (min, max) = defined.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &c| {
        (lo.min(c), hi.max(c))
    });

    if min > max || min == max {
        return vec![None; closes.len()];
    }

    closes
        .iter()
        .map(|c| c.map(|v| (v - min) / (max - min)))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceRecord;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series(ticker: &str, closes: &[Option<f64>]) -> PriceSeries {
        PriceSeries {
            ticker: ticker.to_string(),
            records: closes
                .iter()
                .enumerate()
                .map(|(i, c)| PriceRecord {
                    ticker: ticker.to_string(),
                    date: d(i as u32 + 1),
                    open: *c,
                    high: *c,
                    low: *c,
                    close: *c,
                    volume: Some(1.0),
                })
                .collect(),
        }
    }

    #[test]
    fn daily_return_is_null_at_first_row() {
        let r = daily_returns(&[Some(100.0), Some(110.0), Some(99.0)]);
        assert_eq!(r[0], None);
        assert!((r[1].unwrap() - 0.1).abs() < 1e-12);
        assert!((r[2].unwrap() - (-0.1)).abs() < 1e-12);
    }

    #[test]
    fn daily_return_null_around_undefined_close() {
        let r = daily_returns(&[Some(100.0), None, Some(110.0)]);
        assert_eq!(r, vec![None, None, None]);
    }

    #[test]
    fn cumulative_skips_nulls_without_poisoning() {
        let c = cumulative_returns(&[None, Some(0.1), None, Some(0.2)]);
        assert_eq!(c[0], None);
        assert!((c[1].unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(c[2], None);
        assert!((c[3].unwrap() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn moving_average_needs_full_window() {
        let closes: Vec<Option<f64>> = (1..=5).map(|i| Some(i as f64)).collect();
        let ma = moving_average(&closes, 3);
        assert_eq!(ma[0], None);
        assert_eq!(ma[1], None);
        assert_eq!(ma[2], Some(2.0));
        assert_eq!(ma[4], Some(4.0));
    }

    #[test]
    fn moving_average_null_when_window_has_gap() {
        let closes = vec![Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)];
        let ma = moving_average(&closes, 3);
        assert_eq!(ma[2], None);
        assert_eq!(ma[3], None);
        assert_eq!(ma[4], Some(4.0));
    }

    #[test]
    fn normalized_close_bounds() {
        let n = min_max_normalize(&[Some(10.0), Some(20.0), Some(15.0), None]);
        assert_eq!(n[0], Some(0.0));
        assert_eq!(n[1], Some(1.0));
        assert_eq!(n[2], Some(0.5));
        assert_eq!(n[3], None);
        for v in n.into_iter().flatten() {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn constant_close_normalizes_to_null() {
        let n = min_max_normalize(&[Some(10.0), Some(10.0), Some(10.0)]);
        assert_eq!(n, vec![None, None, None]);
    }

    #[test]
    fn returns_reset_at_ticker_boundary() {
        let a = series("AAPL", &[Some(100.0), Some(110.0)]);
        let b = series("MSFT", &[Some(50.0), Some(55.0)]);
        let rows = assemble(&[a, b]);

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].daily_return, None);
        // MSFT's first row must not read AAPL's last close
        assert_eq!(rows[2].daily_return, None);
        assert_eq!(rows[2].cumulative_return, None);
        assert!((rows[3].daily_return.unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn short_series_has_null_moving_averages() {
        let s = series("AAPL", &[Some(1.0), Some(2.0), Some(3.0)]);
        let rows = compute(&s);
        assert!(rows.iter().all(|r| r.ma_20.is_none() && r.ma_50.is_none()));
    }
}
