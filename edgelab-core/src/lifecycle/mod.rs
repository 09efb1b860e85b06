//! Position lifecycle — per-tick exit state machine.
//!
//! Each tick: update the water mark, arm the trailing stop if the offset is
//! reached, recompute the stop, then check exits in fixed priority order:
//! static stop-loss, take-profit, minimal-ROI table, trailing stop, time
//! stop. The first matching condition wins and its reason is recorded on
//! the resulting trade.
//!
//! Invariant: the water mark and the trailing stop price only move in the
//! favorable direction. Both updates are max/min against the previous
//! value, so no input sequence can loosen them.

pub mod roi;

use chrono::{DateTime, Utc};

use crate::config::StrategyConfig;
use crate::domain::{ExitReason, Position, PositionSide, TrailingStopState};

pub use roi::check_minimal_roi;

/// An exit decision for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitTrigger {
    pub reason: ExitReason,
    /// Fill price before trading costs (the tick price; cost application is
    /// the backtest runner's job).
    pub price: f64,
}

/// Open a position from a passing entry signal.
pub fn open_position(
    symbol: &str,
    side: PositionSide,
    price: f64,
    quantity: f64,
    time: DateTime<Utc>,
    config: &StrategyConfig,
) -> Position {
    let stop_loss = if config.stop_loss_pct > 0.0 {
        Some(match side {
            PositionSide::Long => price * (1.0 - config.stop_loss_pct),
            PositionSide::Short => price * (1.0 + config.stop_loss_pct),
        })
    } else {
        None
    };
    let take_profit = if config.take_profit_pct > 0.0 {
        Some(match side {
            PositionSide::Long => price * (1.0 + config.take_profit_pct),
            PositionSide::Short => price * (1.0 - config.take_profit_pct),
        })
    } else {
        None
    };
    Position {
        symbol: symbol.to_string(),
        side,
        entry_price: price,
        entry_time: time,
        quantity,
        stop_loss,
        take_profit,
        trailing: TrailingStopState::new(config.trailing.enabled, price),
    }
}

/// Advance one tick: mutate trailing state, return an exit if one fires.
pub fn evaluate_tick(
    position: &mut Position,
    price: f64,
    now: DateTime<Utc>,
    config: &StrategyConfig,
) -> Option<ExitTrigger> {
    update_trailing(position, price, config);

    // 1. Static stop-loss: catastrophic condition, checked first.
    if let Some(stop) = position.stop_loss {
        let hit = match position.side {
            PositionSide::Long => price <= stop,
            PositionSide::Short => price >= stop,
        };
        if hit {
            return Some(ExitTrigger {
                reason: ExitReason::StopLoss,
                price,
            });
        }
    }

    // 2. Static take-profit.
    if let Some(target) = position.take_profit {
        let hit = match position.side {
            PositionSide::Long => price >= target,
            PositionSide::Short => price <= target,
        };
        if hit {
            return Some(ExitTrigger {
                reason: ExitReason::TakeProfit,
                price,
            });
        }
    }

    // 3. Time-decaying profit table.
    let held = position.held_minutes(now);
    if check_minimal_roi(&config.minimal_roi, position.profit_pct(price), held) {
        return Some(ExitTrigger {
            reason: ExitReason::RoiTable,
            price,
        });
    }

    // 4. Trailing stop.
    if trailing_hit(position, price, config) {
        return Some(ExitTrigger {
            reason: ExitReason::TrailingStop,
            price,
        });
    }

    // 5. Time stop.
    if config.max_hold_minutes > 0 && held >= config.max_hold_minutes as i64 {
        return Some(ExitTrigger {
            reason: ExitReason::TimeStop,
            price,
        });
    }

    None
}

/// Water-mark update, offset arming, and monotone stop recompute.
fn update_trailing(position: &mut Position, price: f64, config: &StrategyConfig) {
    if !position.trailing.active {
        return;
    }
    let trailing_cfg = &config.trailing;

    match position.side {
        PositionSide::Long => {
            position.trailing.water_mark = position.trailing.water_mark.max(price)
        }
        PositionSide::Short => {
            position.trailing.water_mark = position.trailing.water_mark.min(price)
        }
    }

    // Arming is one-way: once the offset has been reached the tighter
    // callback applies for the rest of the position's life.
    if !position.trailing.armed
        && trailing_cfg.offset_pct > 0.0
        && position.profit_pct(price) >= trailing_cfg.offset_pct
    {
        position.trailing.armed = true;
    }

    let callback = if position.trailing.armed {
        trailing_cfg.armed_callback_pct
    } else {
        trailing_cfg.callback_pct
    };

    let candidate = match position.side {
        PositionSide::Long => position.trailing.water_mark * (1.0 - callback),
        PositionSide::Short => position.trailing.water_mark * (1.0 + callback),
    };
    position.trailing.stop_price = Some(match (position.trailing.stop_price, position.side) {
        (Some(current), PositionSide::Long) => current.max(candidate),
        (Some(current), PositionSide::Short) => current.min(candidate),
        (None, _) => candidate,
    });
}

fn trailing_hit(position: &Position, price: f64, config: &StrategyConfig) -> bool {
    if !position.trailing.active {
        return false;
    }
    if config.trailing.only_offset_is_reached && !position.trailing.armed {
        return false;
    }
    match (position.trailing.stop_price, position.side) {
        (Some(stop), PositionSide::Long) => price <= stop,
        (Some(stop), PositionSide::Short) => price >= stop,
        (None, _) => false,
    }
}
