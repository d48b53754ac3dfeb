use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Price record (Bronze → Silver) ────────────────────────────────────────────

/// One (ticker, day) observation. Optional fields stay `None` through the
/// cleaning chain until a fill stage resolves them.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl PriceRecord {
    /// All-null placeholder inserted for a calendar day missing from the raw
    /// source. Prices are resolved by the post-reindex forward fill.
    pub fn gap_filler(ticker: &str, date: NaiveDate) -> Self {
        Self {
            ticker: ticker.to_string(),
            date,
            open: None,
            high: None,
            low: None,
            close: None,
            volume: None,
        }
    }

    /// True when every OHLC field is missing (volume ignored).
    pub fn all_prices_missing(&self) -> bool {
        self.open.is_none() && self.high.is_none() && self.low.is_none() && self.close.is_none()
    }
}

/// One ticker's records in ascending date order. Built by the explicit
/// partition step; per-ticker stages never see another ticker's rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub ticker: String,
    pub records: Vec<PriceRecord>,
}

// ── Curated price row (Silver output schema) ──────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Open")]
    pub open: Option<f64>,
    #[serde(rename = "High")]
    pub high: Option<f64>,
    #[serde(rename = "Low")]
    pub low: Option<f64>,
    #[serde(rename = "Close")]
    pub close: Option<f64>,
    #[serde(rename = "Volume")]
    pub volume: Option<f64>,
    #[serde(rename = "Stock")]
    pub ticker: String,
    #[serde(rename = "Daily_Return")]
    pub daily_return: Option<f64>,
    #[serde(rename = "Cumulative_Return")]
    pub cumulative_return: Option<f64>,
    #[serde(rename = "MA_20")]
    pub ma_20: Option<f64>,
    #[serde(rename = "MA_50")]
    pub ma_50: Option<f64>,
    #[serde(rename = "Normalized_Close")]
    pub normalized_close: Option<f64>,
}

// ── Portfolio transactions ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeType {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
}

impl TradeType {
    /// Exact, case-sensitive match. Anything else is not a trade type.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(TradeType::Buy),
            "SELL" => Some(TradeType::Sell),
            _ => None,
        }
    }
}

/// A transaction that passed every sanitizer filter. Fields are non-optional
/// on purpose: a row with a hole never becomes a `Transaction`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    #[serde(rename = "Trade_Date")]
    pub trade_date: NaiveDate,
    #[serde(rename = "Stock")]
    pub ticker: String,
    #[serde(rename = "Trade_Type")]
    pub trade_type: TradeType,
    #[serde(rename = "Quantity")]
    pub quantity: f64,
    #[serde(rename = "Price")]
    pub price: f64,
}

// ── Raw CSV rows ──────────────────────────────────────────────────────────────

/// Raw transaction row exactly as read from disk; every field is an opaque
/// string until the sanitizer coerces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTransactionRow {
    pub trade_date: Option<String>,
    pub ticker: Option<String>,
    pub trade_type: Option<String>,
    pub quantity: Option<String>,
    pub price: Option<String>,
}
