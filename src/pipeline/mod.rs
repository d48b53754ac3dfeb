//! Pipeline orchestrator: validation → price chain → features → transaction
//! sanitation → atomic Silver write.
//!
//! Single-threaded and synchronous. Any failure surfaces before the commit,
//! so a run either produces both curated tables or neither. Re-running on
//! identical inputs rewrites byte-identical outputs: the sort, the fill
//! policy and the calendar are all deterministic and no data column depends
//! on the wall clock.

use crate::config::AppConfig;
use crate::features;
use crate::loader;
use crate::normalizer;
use crate::sanitizer;
use crate::validation::RequiredInputs;
use crate::writer;
use anyhow::{Context, Result};
use std::time::Instant;
use tracing::info;

pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<PipelineStats> {
        let started = Instant::now();

        let inputs = RequiredInputs::from_config(&self.config);
        inputs.check_exists()?;

        // ── 1. Bronze: load and tag every ticker ──────────────────────────────
        info!("=== Step 1: Loading {} price files ===", inputs.price_files.len());
        let mut combined = Vec::new();
        for (ticker, path) in &inputs.price_files {
            let rows = loader::load_price_file(path, ticker)
                .with_context(|| format!("load price file for {ticker}"))?;
            combined.extend(rows);
        }

        // ── 2. Silver: normalize onto the trading calendar ────────────────────
        info!("=== Step 2: Normalizing {} raw rows ===", combined.len());
        let series = normalizer::normalize(combined);

        // ── 3. Features per ticker ────────────────────────────────────────────
        info!("=== Step 3: Deriving features for {} tickers ===", series.len());
        let curated = features::assemble(&series);

        // ── 4. Transactions, independent of the price path ────────────────────
        info!("=== Step 4: Sanitizing transactions ===");
        let raw_transactions = loader::load_transactions(&inputs.transactions_file)?;
        let (transactions, tx_stats) = sanitizer::sanitize(raw_transactions);

        // ── 5. Atomic two-table commit ────────────────────────────────────────
        info!("=== Step 5: Writing Silver outputs ===");
        writer::write_outputs(
            &self.config.data.processed_dir,
            &self.config.pipeline.price_output,
            &self.config.pipeline.transactions_output,
            &curated,
            &transactions,
        )?;

        let stats = PipelineStats {
            tickers: series.len(),
            price_rows: curated.len(),
            transactions_kept: tx_stats.kept,
            transactions_dropped: tx_stats.dropped,
        };

        info!(
            "=== Done in {:.2?}: {} tickers | {} curated price rows | {} transactions kept ({} dropped) ===",
            started.elapsed(),
            stats.tickers,
            stats.price_rows,
            stats.transactions_kept,
            stats.transactions_dropped,
        );
        Ok(stats)
    }
}

#[derive(Debug)]
pub struct PipelineStats {
    pub tickers: usize,
    pub price_rows: usize,
    pub transactions_kept: usize,
    pub transactions_dropped: usize,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
