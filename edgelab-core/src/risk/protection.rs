//! Protection manager — behavioral circuit breakers.
//!
//! Both breakers are computed from recent *closed* trades only and measured
//! in candle widths, not wall-clock minutes, so they scale with the
//! timeframe. With no trade history they never fire.

use chrono::{DateTime, Duration, Utc};

use crate::config::ProtectionConfig;
use crate::domain::{ExitReason, Trade};

/// Outcome of the protection checks.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtectionVerdict {
    Pass,
    Reject(String),
}

/// Evaluate both breakers for a candidate entry on `symbol` at `now`.
///
/// `candle_width_minutes` converts the candle-unit windows into time.
pub fn check(
    symbol: &str,
    recent_trades: &[Trade],
    cfg: &ProtectionConfig,
    candle_width_minutes: i64,
    now: DateTime<Utc>,
) -> ProtectionVerdict {
    if !cfg.enabled || recent_trades.is_empty() || candle_width_minutes <= 0 {
        return ProtectionVerdict::Pass;
    }

    // Cooldown: no re-entry for a symbol right after its own stop-loss.
    let cooldown = Duration::minutes(cfg.cooldown_candles as i64 * candle_width_minutes);
    let own_stop = recent_trades
        .iter()
        .filter(|t| t.symbol == symbol && t.exit_reason == ExitReason::StopLoss)
        .map(|t| t.exit_time)
        .max();
    if let Some(stop_time) = own_stop {
        if now - stop_time < cooldown {
            return ProtectionVerdict::Reject(format!(
                "cooldown: {symbol} stopped out {} minutes ago",
                (now - stop_time).num_minutes()
            ));
        }
    }

    // Stop-loss-rate guard: too many stops across the lookback window.
    let lookback = Duration::minutes(cfg.lookback_candles as i64 * candle_width_minutes);
    let guard_cooldown =
        Duration::minutes(cfg.guard_cooldown_candles as i64 * candle_width_minutes);
    let mut stop_times: Vec<DateTime<Utc>> = recent_trades
        .iter()
        .filter(|t| t.exit_reason == ExitReason::StopLoss)
        .filter(|t| cfg.all_symbols || t.symbol == symbol)
        .filter(|t| now - t.exit_time < lookback)
        .map(|t| t.exit_time)
        .collect();
    if stop_times.len() >= cfg.max_stop_losses && cfg.max_stop_losses > 0 {
        stop_times.sort();
        let tripped_at = stop_times[stop_times.len() - 1];
        if now - tripped_at < guard_cooldown {
            return ProtectionVerdict::Reject(format!(
                "stop-loss guard: {} stop-losses within lookback window",
                stop_times.len()
            ));
        }
    }

    ProtectionVerdict::Pass
}
