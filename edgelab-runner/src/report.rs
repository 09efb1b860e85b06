//! JSON export for backtest and validation artifacts.
//!
//! Everything the runner produces is serde-serializable; this module just
//! pins the layout: one pretty-printed JSON file per artifact, named after
//! the symbol and artifact kind.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::backtest::BacktestResult;

/// Serialize any report artifact to a pretty JSON string.
pub fn to_json<T: Serialize>(artifact: &T) -> Result<String> {
    serde_json::to_string_pretty(artifact).context("serializing report artifact")
}

/// Write one artifact as `<dir>/<stem>.json`, creating the directory.
pub fn write_json<T: Serialize>(dir: impl AsRef<Path>, stem: &str, artifact: &T) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("creating report directory {}", dir.display()))?;
    let path = dir.join(format!("{stem}.json"));
    let json = to_json(artifact)?;
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// Export a full backtest run as `<symbol>_backtest.json`.
///
/// The file stem replaces `/` in the symbol so `BTC/USDT` stays a single
/// path component.
pub fn export_backtest(dir: impl AsRef<Path>, result: &BacktestResult) -> Result<PathBuf> {
    let stem = format!("{}_backtest", result.symbol.replace('/', "_"));
    log::info!(
        "exporting backtest for {}: {} trades, exported at {}",
        result.symbol,
        result.trades.len(),
        Utc::now().to_rfc3339()
    );
    write_json(dir, &stem, result)
}
