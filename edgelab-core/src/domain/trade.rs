//! Trade — a completed round trip, the append-only ledger entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::position::PositionSide;
use crate::numeric::safe_div;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitReason {
    /// Closed by an explicit sell/cover signal.
    ExitSignal,
    StopLoss,
    TakeProfit,
    TrailingStop,
    /// Time-decaying minimal-ROI table satisfied.
    RoiTable,
    TimeStop,
    /// Force-closed at the end of a backtest series.
    Forced,
}

/// Closed-position snapshot. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub side: PositionSide,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub quantity: f64,
    /// Realized P&L in quote currency, net of costs.
    pub pnl: f64,
    /// Realized return as a signed fraction of entry cost.
    pub pnl_pct: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    /// Holding duration in whole minutes.
    pub fn held_minutes(&self) -> i64 {
        (self.exit_time - self.entry_time).num_minutes().max(0)
    }

    /// Build a trade from exit fill details, deriving pnl fields.
    ///
    /// `costs` is the total round-trip cost in quote currency (fees plus
    /// slippage), subtracted from gross P&L.
    #[allow(clippy::too_many_arguments)]
    pub fn from_exit(
        symbol: &str,
        side: PositionSide,
        entry_time: DateTime<Utc>,
        entry_price: f64,
        exit_time: DateTime<Utc>,
        exit_price: f64,
        quantity: f64,
        costs: f64,
        exit_reason: ExitReason,
    ) -> Self {
        let gross = match side {
            PositionSide::Long => (exit_price - entry_price) * quantity,
            PositionSide::Short => (entry_price - exit_price) * quantity,
        };
        let pnl = gross - costs;
        let pnl_pct = safe_div(pnl, entry_price * quantity);
        Self {
            symbol: symbol.to_string(),
            side,
            entry_time,
            entry_price,
            exit_time,
            exit_price,
            quantity,
            pnl,
            pnl_pct,
            exit_reason,
        }
    }
}
