//! Named rule conditions — pure predicates over an indicator snapshot.
//!
//! Conditions are referenced by name from configuration. An unknown name
//! evaluates to false and warns once per name; it never panics, so a typo
//! disables one condition instead of the whole strategy.

use log::warn;
use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use crate::indicators::vwap::vwap_deviation;
use crate::indicators::IndicatorSnapshot;

const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;
/// Fractional distance from VWAP considered over-extended.
const VWAP_STRETCH: f64 = 0.02;

/// Evaluate one named condition against a snapshot.
pub fn evaluate(name: &str, snap: &IndicatorSnapshot) -> bool {
    match name {
        // MA structure and crossovers. The snapshot carries previous-period
        // values, so crossovers need no history lookback.
        "golden_cross" => {
            snap.prev_short_ma <= snap.prev_long_ma && snap.short_ma > snap.long_ma
        }
        "death_cross" => snap.prev_short_ma >= snap.prev_long_ma && snap.short_ma < snap.long_ma,
        "ma_uptrend" => snap.short_ma > snap.long_ma,
        "ma_downtrend" => snap.short_ma < snap.long_ma,

        // RSI levels and direction.
        "rsi_oversold" => snap.rsi < RSI_OVERSOLD,
        "rsi_overbought" => snap.rsi > RSI_OVERBOUGHT,
        "rsi_rising" => snap.rsi > snap.prev_rsi,
        "rsi_falling" => snap.rsi < snap.prev_rsi,

        // MACD crossovers and histogram momentum.
        "macd_bullish" => {
            snap.prev_macd <= snap.prev_macd_signal && snap.macd > snap.macd_signal
        }
        "macd_bearish" => {
            snap.prev_macd >= snap.prev_macd_signal && snap.macd < snap.macd_signal
        }
        "histogram_expansion" => {
            snap.macd_histogram > snap.prev_macd_histogram && snap.macd_histogram > 0.0
        }
        "histogram_contraction" => {
            snap.macd_histogram < snap.prev_macd_histogram && snap.macd_histogram < 0.0
        }

        // VWAP band positioning. A zero VWAP means the session had no
        // volume; bands are meaningless then, so nothing fires.
        "above_vwap" => snap.vwap.vwap > 0.0 && snap.close > snap.vwap.vwap,
        "below_vwap" => snap.vwap.vwap > 0.0 && snap.close < snap.vwap.vwap,
        "above_vwap_upper" => snap.vwap.vwap > 0.0 && snap.close > snap.vwap.upper,
        "below_vwap_lower" => snap.vwap.vwap > 0.0 && snap.close < snap.vwap.lower,
        "above_vwap_upper_2" => snap.vwap.vwap > 0.0 && snap.close > snap.vwap.upper_2,
        "below_vwap_lower_2" => snap.vwap.vwap > 0.0 && snap.close < snap.vwap.lower_2,
        "stretched_above_vwap" => {
            snap.vwap.vwap > 0.0 && vwap_deviation(snap.close, &snap.vwap) > VWAP_STRETCH
        }
        "stretched_below_vwap" => {
            snap.vwap.vwap > 0.0 && vwap_deviation(snap.close, &snap.vwap) < -VWAP_STRETCH
        }

        // Externally-injected context; absent values never fire.
        "order_flow_bullish" => snap.order_flow_delta.is_some_and(|d| d > 0.0),
        "order_flow_bearish" => snap.order_flow_delta.is_some_and(|d| d < 0.0),
        "funding_positive" => snap.funding_rate.is_some_and(|f| f > 0.0),
        "funding_negative" => snap.funding_rate.is_some_and(|f| f < 0.0),

        unknown => {
            warn_unknown_once(unknown);
            false
        }
    }
}

/// Warn the first time each unknown name is seen; a backtest evaluates the
/// same condition list every tick and must not flood the log.
fn warn_unknown_once(name: &str) {
    static SEEN: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    let seen = SEEN.get_or_init(|| Mutex::new(HashSet::new()));
    if let Ok(mut names) = seen.lock() {
        if names.insert(name.to_string()) {
            warn!("unknown rule condition {name:?}, evaluating false");
        }
    }
}

/// Evaluate a condition list with AND semantics, collecting satisfied names.
///
/// An empty list means "not configured" and never fires.
pub fn evaluate_all(names: &[String], snap: &IndicatorSnapshot) -> Option<Vec<String>> {
    if names.is_empty() {
        return None;
    }
    let mut satisfied = Vec::with_capacity(names.len());
    for name in names {
        if !evaluate(name, snap) {
            return None;
        }
        satisfied.push(name.clone());
    }
    Some(satisfied)
}
