mod config;
mod error;
mod features;
mod gate;
mod loader;
mod models;
mod normalizer;
mod pipeline;
mod sanitizer;
mod validation;
mod writer;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::AppConfig;
use crate::gate::WatermarkStore;
use crate::pipeline::Pipeline;
use crate::validation::{RequiredInputs, PRICE_COLUMNS, TRANSACTION_COLUMNS};

#[derive(Parser)]
#[command(name = "silver-etl", about = "Stock market Silver-layer ETL", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Clean and normalize raw inputs, then write both curated tables
    Run {
        /// Skip the freshness gate and run unconditionally
        #[arg(short, long)]
        force: bool,
    },

    /// Check that every required input file exists and carries its schema
    Validate,

    /// Report whether new raw data has arrived since the last successful run
    Freshness,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "stock_silver_etl=info,warn",
        1 => "stock_silver_etl=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Run { force } => {
            let store = WatermarkStore::new(config.data.watermark_path.clone());

            if !force && !gate::has_fresh_data(&store, &config.data.raw_stock_dir)? {
                info!("No raw data newer than the watermark; nothing to do (use --force to override)");
                return Ok(());
            }

            let stats = Pipeline::new(config).run()?;
            gate::mark_success(&store)?;

            info!(
                "Run complete: {} tickers, {} price rows, {} transactions kept ({} dropped)",
                stats.tickers, stats.price_rows, stats.transactions_kept, stats.transactions_dropped
            );
        }

        Command::Validate => {
            let inputs = RequiredInputs::from_config(&config);
            inputs.check_exists()?;

            for (ticker, path) in &inputs.price_files {
                validation::check_file_columns(path, &PRICE_COLUMNS)?;
                println!("  ok: {} ({})", ticker, path.display());
            }
            validation::check_file_columns(&inputs.transactions_file, &TRANSACTION_COLUMNS)?;
            println!("  ok: transactions ({})", inputs.transactions_file.display());
            println!("All required inputs present and schema-conformant.");
        }

        Command::Freshness => {
            let store = WatermarkStore::new(config.data.watermark_path.clone());
            let watermark = store.get()?;
            let latest = gate::latest_input_mtime(&config.data.raw_stock_dir)?;
            let fresh = gate::has_fresh_data(&store, &config.data.raw_stock_dir)?;

            println!("Watermark        : {}", fmt_ts(watermark));
            println!("Latest input     : {}", fmt_ts(latest));
            println!("Run needed       : {}", if fresh { "yes" } else { "no" });
        }
    }

    Ok(())
}

fn fmt_ts(ts: Option<f64>) -> String {
    ts.map(|t| format!("{t:.3}")).unwrap_or_else(|| "—".into())
}
