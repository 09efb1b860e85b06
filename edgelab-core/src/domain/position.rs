//! Position — an open trade owned by the lifecycle simulator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::numeric::safe_div;

/// Side of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

/// Mutable trailing-stop tracking attached to a position.
///
/// Invariant: `water_mark` and `stop_price` only ever move in the favorable
/// direction for the position's side. The lifecycle simulator enforces this
/// with max/min updates; nothing else writes these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailingStopState {
    /// Whether trailing is enabled for this position at all.
    pub active: bool,
    /// Highest price since entry (long) or lowest (short).
    pub water_mark: f64,
    /// Current trailing stop level, once one has been computed.
    pub stop_price: Option<f64>,
    /// Whether the positive-offset transition has occurred.
    pub armed: bool,
}

impl TrailingStopState {
    pub fn new(active: bool, entry_price: f64) -> Self {
        Self {
            active,
            water_mark: entry_price,
            stop_price: None,
            armed: false,
        }
    }
}

/// An open position. Created from a passing entry signal, mutated once per
/// tick by the lifecycle simulator, destroyed on exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub quantity: f64,
    /// Static stop-loss price, if configured.
    pub stop_loss: Option<f64>,
    /// Static take-profit price, if configured.
    pub take_profit: Option<f64>,
    pub trailing: TrailingStopState,
}

impl Position {
    /// Unrealized return as a signed fraction of entry price.
    ///
    /// Zero entry price resolves to 0 rather than NaN.
    pub fn profit_pct(&self, current_price: f64) -> f64 {
        match self.side {
            PositionSide::Long => safe_div(current_price - self.entry_price, self.entry_price),
            PositionSide::Short => safe_div(self.entry_price - current_price, self.entry_price),
        }
    }

    /// Whole minutes held as of `now`.
    pub fn held_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.entry_time).num_minutes().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn long_position(entry: f64) -> Position {
        Position {
            symbol: "BTC/USDT".into(),
            side: PositionSide::Long,
            entry_price: entry,
            entry_time: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            quantity: 1.0,
            stop_loss: None,
            take_profit: None,
            trailing: TrailingStopState::new(true, entry),
        }
    }

    #[test]
    fn long_profit_pct() {
        let pos = long_position(100.0);
        assert!((pos.profit_pct(110.0) - 0.10).abs() < 1e-12);
        assert!((pos.profit_pct(90.0) + 0.10).abs() < 1e-12);
    }

    #[test]
    fn short_profit_pct_is_inverted() {
        let mut pos = long_position(100.0);
        pos.side = PositionSide::Short;
        assert!((pos.profit_pct(90.0) - 0.10).abs() < 1e-12);
    }

    #[test]
    fn zero_entry_price_yields_zero_not_nan() {
        let pos = long_position(0.0);
        assert_eq!(pos.profit_pct(50.0), 0.0);
    }

    #[test]
    fn held_minutes_never_negative() {
        let pos = long_position(100.0);
        let before_entry = pos.entry_time - chrono::Duration::minutes(5);
        assert_eq!(pos.held_minutes(before_entry), 0);
    }
}
