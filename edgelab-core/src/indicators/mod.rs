//! Indicator engine — per-tick snapshot of derived values.
//!
//! The snapshot carries both the current and previous-period value for every
//! indicator family, so crossover detection never needs an external history
//! buffer. A window shorter than the warmup yields `None`, which propagates
//! downstream as "no trade" rather than an error.

pub mod math;
pub mod vwap;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::IndicatorConfig;
use crate::domain::Candle;

pub use vwap::{session_vwap, vwap_deviation, VwapBands};

/// Derived values for one candle, computed fresh each tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub prev_close: f64,

    pub short_ma: f64,
    pub prev_short_ma: f64,
    pub long_ma: f64,
    pub prev_long_ma: f64,

    pub rsi: f64,
    pub prev_rsi: f64,

    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub prev_macd: f64,
    pub prev_macd_signal: f64,
    pub prev_macd_histogram: f64,

    pub vwap: VwapBands,

    /// Externally-injected context; absent unless a collaborator supplies it.
    pub order_flow_delta: Option<f64>,
    pub funding_rate: Option<f64>,
    pub dominance: Option<f64>,

    /// Strategy-populated extras. Built-in fields live outside this map, so
    /// a plugin can never clobber them; existing extras win over re-inserts.
    pub extras: HashMap<String, f64>,
}

impl IndicatorSnapshot {
    /// Merge one strategy-supplied value. First write wins.
    pub fn merge_extra(&mut self, key: &str, value: f64) {
        self.extras.entry(key.to_string()).or_insert(value);
    }

    pub fn extra(&self, key: &str) -> Option<f64> {
        self.extras.get(key).copied()
    }
}

/// Compute a snapshot over an ascending candle window.
///
/// Returns `None` when the window is shorter than
/// `IndicatorConfig::warmup()`; every value in a returned snapshot is
/// finite.
pub fn compute_snapshot(candles: &[Candle], cfg: &IndicatorConfig) -> Option<IndicatorSnapshot> {
    if candles.len() < cfg.warmup() {
        return None;
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let n = closes.len();
    let last = n - 1;
    let prev = n - 2;

    let short = math::sma_series(&closes, cfg.short_ma);
    let long = math::sma_series(&closes, cfg.long_ma);
    let rsi = math::rsi_series(&closes, cfg.rsi_period);
    let (macd, signal, histogram) =
        math::macd_series(&closes, cfg.macd_fast, cfg.macd_slow, cfg.macd_signal);

    // Warmup guarantees the last two entries of every series are defined;
    // a NaN here would mean the warmup formula is wrong.
    let at = |series: &[f64], i: usize| {
        let v = series[i];
        if v.is_nan() {
            0.0
        } else {
            v
        }
    };

    Some(IndicatorSnapshot {
        close: closes[last],
        prev_close: closes[prev],
        short_ma: at(&short, last),
        prev_short_ma: at(&short, prev),
        long_ma: at(&long, last),
        prev_long_ma: at(&long, prev),
        rsi: at(&rsi, last),
        prev_rsi: at(&rsi, prev),
        macd: at(&macd, last),
        macd_signal: at(&signal, last),
        macd_histogram: at(&histogram, last),
        prev_macd: at(&macd, prev),
        prev_macd_signal: at(&signal, prev),
        prev_macd_histogram: at(&histogram, prev),
        vwap: session_vwap(candles),
        order_flow_delta: None,
        funding_rate: None,
        dominance: None,
        extras: HashMap::new(),
    })
}

/// Create synthetic candles from close prices for testing.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    use chrono::{TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let open_time = base + chrono::Duration::minutes(15 * i as i64);
            Candle {
                open_time,
                close_time: open_time + chrono::Duration::minutes(15),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}
