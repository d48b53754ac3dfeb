//! Freshness gate collaborators: the persisted watermark and the
//! input-mtime comparison that decides whether a run is warranted.
//!
//! This sits outside the core pipeline. The transformation stages never read
//! or write the watermark; the CLI consults the gate before invoking
//! [`crate::pipeline::Pipeline`] and advertises success afterwards.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct WatermarkState {
    /// Seconds since the Unix epoch of the last successful run.
    last_processed_ts: f64,
}

/// File-backed get/set store for the gate's "last processed" marker.
/// Explicit state, never a global inside the transformation logic.
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// None when no run has ever completed.
    pub fn get(&self) -> Result<Option<f64>> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("read watermark {:?}", self.path))?;
        let state: WatermarkState =
            serde_json::from_str(&raw).with_context(|| format!("parse watermark {:?}", self.path))?;
        Ok(Some(state.last_processed_ts))
    }

    pub fn set(&self, last_processed_ts: f64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create watermark dir {parent:?}"))?;
        }
        let raw = serde_json::to_string_pretty(&WatermarkState { last_processed_ts })?;
        fs::write(&self.path, raw).with_context(|| format!("write watermark {:?}", self.path))?;
        Ok(())
    }
}

/// Newest modification time (epoch seconds) among files directly under `dir`.
pub fn latest_input_mtime(dir: &Path) -> Result<Option<f64>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut latest: Option<f64> = None;
    for entry in fs::read_dir(dir).with_context(|| format!("read input dir {dir:?}"))? {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        let ts = modified
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        latest = Some(latest.map_or(ts, |cur: f64| cur.max(ts)));
    }
    Ok(latest)
}

/// True when raw data newer than the watermark exists. Missing input
/// directory or an empty one means "nothing to do", not an error.
pub fn has_fresh_data(store: &WatermarkStore, raw_stock_dir: &Path) -> Result<bool> {
    let Some(latest) = latest_input_mtime(raw_stock_dir)? else {
        return Ok(false);
    };

    let watermark = store.get()?;
    let decision = match watermark {
        None => true,
        Some(watermark) => latest > watermark,
    };
    debug!(
        "Freshness: latest input mtime {:.3}, watermark {:?}, proceed = {}",
        latest, watermark, decision
    );
    Ok(decision)
}

/// Advertise a completed run. The marker is wall-clock based and strictly
/// grows between successful runs; data columns never depend on it.
pub fn mark_success(store: &WatermarkStore) -> Result<()> {
    let now = Utc::now().timestamp_millis() as f64 / 1000.0;
    store.set(now)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
