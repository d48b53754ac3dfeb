use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub data: DataConfig,
    pub pipeline: PipelineConfig,
}

/// Input/output locations (mirrors the mounted-volume layout of the
/// orchestrator that invokes us)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    #[serde(default = "default_raw_stock_dir")]
    pub raw_stock_dir: PathBuf,

    #[serde(default = "default_raw_portfolio_dir")]
    pub raw_portfolio_dir: PathBuf,

    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,

    /// State file of the freshness gate, not of the pipeline itself.
    #[serde(default = "default_watermark_path")]
    pub watermark_path: PathBuf,
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Ticker universe. Each entry maps to `<TICKER>.csv` under the raw stock
    /// directory; the label is taken from here, never from file contents.
    #[serde(default = "default_tickers")]
    pub tickers: Vec<String>,

    #[serde(default = "default_transactions_file")]
    pub transactions_file: String,

    #[serde(default = "default_price_output")]
    pub price_output: String,

    #[serde(default = "default_transactions_output")]
    pub transactions_output: String,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_raw_stock_dir() -> PathBuf {
    PathBuf::from("data/raw/stocks")
}
fn default_raw_portfolio_dir() -> PathBuf {
    PathBuf::from("data/raw/portfolio")
}
fn default_processed_dir() -> PathBuf {
    PathBuf::from("data/processed")
}
fn default_watermark_path() -> PathBuf {
    PathBuf::from("data/stocks_last_processed.json")
}
fn default_tickers() -> Vec<String> {
    vec!["AAPL".into(), "MSFT".into(), "GOOGL".into()]
}
fn default_transactions_file() -> String {
    "transactions.csv".to_string()
}
fn default_price_output() -> String {
    "cleaned_stock_data.csv".to_string()
}
fn default_transactions_output() -> String {
    "cleaned_transactions.csv".to_string()
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("SILVER").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|_| AppConfig::default());
        Ok(app_cfg)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig {
                raw_stock_dir: default_raw_stock_dir(),
                raw_portfolio_dir: default_raw_portfolio_dir(),
                processed_dir: default_processed_dir(),
                watermark_path: default_watermark_path(),
            },
            pipeline: PipelineConfig {
                tickers: default_tickers(),
                transactions_file: default_transactions_file(),
                price_output: default_price_output(),
                transactions_output: default_transactions_output(),
            },
        }
    }
}
