//! Pluggable strategy interface.
//!
//! A strategy sees the indicator snapshot, the resolved config, the current
//! position side, and the injected state store. It never sees portfolio
//! equity or candle history directly; anything it needs per-tick must come
//! from the snapshot or its own state counters.

use crate::config::StrategyConfig;
use crate::domain::{Direction, Position, PositionSide};
use crate::indicators::IndicatorSnapshot;
use crate::state::StateStore;

/// Per-tick context handed to a strategy.
pub struct StrategyContext<'a> {
    pub symbol: &'a str,
    pub snapshot: &'a IndicatorSnapshot,
    pub config: &'a StrategyConfig,
    pub current_side: Option<PositionSide>,
    pub state: &'a dyn StateStore,
}

impl std::fmt::Debug for dyn Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy").field("id", &self.id()).finish()
    }
}

/// A pluggable signal strategy.
pub trait Strategy: Send + Sync {
    /// Registry id, e.g. "momentum_breakout".
    fn id(&self) -> &str;

    /// Merge strategy-specific derived values into the snapshot.
    ///
    /// Values land in `snapshot.extras`; built-in fields cannot be
    /// overwritten (first write wins there too).
    fn populate_indicators(&self, _snapshot: &mut IndicatorSnapshot) {}

    /// Decide the tick's direction. `Direction::None` abstains.
    fn populate_signal(&self, ctx: &StrategyContext<'_>) -> Direction;

    /// Optional custom exit: return a reason string to close the position
    /// ahead of the standard stop/ROI/trailing checks.
    fn should_exit(
        &self,
        _position: &Position,
        _price: f64,
        _snapshot: &IndicatorSnapshot,
    ) -> Option<String> {
        None
    }
}
