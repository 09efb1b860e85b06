//! Candle — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candle for a single symbol over a fixed interval.
///
/// Candles are immutable once produced and always ordered ascending by
/// `open_time`. Every downstream computation (indicators, regime, backtest)
/// consumes slices of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Volume-weighted typical price component: (H + L + C) / 3.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Candle width in whole minutes (0 when timestamps are degenerate).
    pub fn width_minutes(&self) -> i64 {
        (self.close_time - self.open_time).num_minutes().max(0)
    }

    /// Basic OHLCV sanity check: high >= low, high envelopes open/close.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.volume >= 0.0
    }
}
