//! Signal — an immutable per-tick trading decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSnapshot;

/// Directional intent of a signal.
///
/// `Buy`/`Sell` open and close long exposure, `Short`/`Cover` the short
/// side. `None` means no action this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Buy,
    Sell,
    Short,
    Cover,
    None,
}

impl Direction {
    /// True for the two directions that open a position.
    pub fn is_entry(&self) -> bool {
        matches!(self, Direction::Buy | Direction::Short)
    }

    /// True for the two directions that close a position.
    pub fn is_exit(&self) -> bool {
        matches!(self, Direction::Sell | Direction::Cover)
    }
}

/// An immutable signal emitted by a detector for one symbol on one tick.
///
/// Carries the snapshot it was computed from and the names of the satisfied
/// conditions so downstream consumers (risk gates, reporting) never need to
/// re-derive why the signal fired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub direction: Direction,
    pub price: f64,
    pub indicators: IndicatorSnapshot,
    /// Names of the rule conditions that evaluated true.
    pub reasons: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Signal {
    /// A no-action signal for `symbol` at `price`.
    pub fn none(
        symbol: &str,
        price: f64,
        indicators: IndicatorSnapshot,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            direction: Direction::None,
            price,
            indicators,
            reasons: Vec::new(),
            timestamp,
        }
    }
}
