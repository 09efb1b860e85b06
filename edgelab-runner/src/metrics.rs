//! Performance metrics — pure reductions over a trade ledger and equity
//! curve.
//!
//! Every metric is defined for empty input: no trade list or flat equity
//! curve ever errors, it just produces the documented zero/neutral value.
//! Profit factor is the one metric allowed to be infinite (all wins, no
//! losses).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use edgelab_core::domain::{ExitReason, Trade};
use edgelab_core::numeric::{mean, safe_div, std_dev};

use crate::backtest::EquityPoint;

/// Aggregate statistics for one backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// wins / closed trades; 0 when there are no closed trades.
    pub win_rate: f64,
    /// sum(wins) / sum(|losses|); +inf all-wins, 0 all-losses or empty.
    pub profit_factor: f64,
    pub avg_win_pct: f64,
    pub avg_loss_pct: f64,
    /// |avg win| / |avg loss|; 0 when either side is empty.
    pub win_loss_ratio: f64,
    pub max_drawdown_pct: f64,
    pub max_drawdown_abs: f64,
    /// mean / std of per-step equity returns; 0 for flat equity.
    pub sharpe: f64,
    pub best_trade_pct: f64,
    pub worst_trade_pct: f64,
    pub avg_hold_minutes: f64,
    pub total_return: f64,
    pub exit_reasons: HashMap<ExitReason, usize>,
}

impl Metrics {
    /// Compute all metrics. Defined for any input, including empty.
    pub fn compute(trades: &[Trade], initial_equity: f64, equity_curve: &[EquityPoint]) -> Self {
        let wins: Vec<&Trade> = trades.iter().filter(|t| t.pnl > 0.0).collect();
        let losses: Vec<&Trade> = trades.iter().filter(|t| t.pnl <= 0.0).collect();

        let gross_wins: f64 = wins.iter().map(|t| t.pnl).sum();
        let gross_losses: f64 = losses.iter().map(|t| t.pnl.abs()).sum();
        let profit_factor = if gross_losses == 0.0 {
            if gross_wins > 0.0 {
                f64::INFINITY
            } else {
                0.0
            }
        } else {
            gross_wins / gross_losses
        };

        let win_pcts: Vec<f64> = wins.iter().map(|t| t.pnl_pct).collect();
        let loss_pcts: Vec<f64> = losses.iter().map(|t| t.pnl_pct).collect();
        let avg_win_pct = mean(&win_pcts);
        let avg_loss_pct = mean(&loss_pcts);

        let (max_drawdown_pct, max_drawdown_abs) = max_drawdown(equity_curve);

        let mut exit_reasons = HashMap::new();
        for trade in trades {
            *exit_reasons.entry(trade.exit_reason).or_insert(0) += 1;
        }

        let hold_minutes: Vec<f64> = trades.iter().map(|t| t.held_minutes() as f64).collect();

        let final_equity = equity_curve.last().map(|p| p.equity).unwrap_or(initial_equity);

        Self {
            total_trades: trades.len(),
            wins: wins.len(),
            losses: losses.len(),
            win_rate: safe_div(wins.len() as f64, trades.len() as f64),
            profit_factor,
            avg_win_pct,
            avg_loss_pct,
            win_loss_ratio: safe_div(avg_win_pct.abs(), avg_loss_pct.abs()),
            max_drawdown_pct,
            max_drawdown_abs,
            sharpe: sharpe(equity_curve),
            best_trade_pct: extreme(trades, f64::max),
            worst_trade_pct: extreme(trades, f64::min),
            avg_hold_minutes: mean(&hold_minutes),
            total_return: safe_div(final_equity - initial_equity, initial_equity),
            exit_reasons,
        }
    }
}

/// Extreme trade return under `pick`; 0.0 only for an empty ledger, so an
/// all-losing ledger still reports its (negative) best trade.
fn extreme(trades: &[Trade], pick: fn(f64, f64) -> f64) -> f64 {
    trades
        .iter()
        .map(|t| t.pnl_pct)
        .reduce(pick)
        .unwrap_or(0.0)
}

/// Peak-to-trough drawdown over the equity curve, as (fraction, absolute).
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> (f64, f64) {
    let mut peak = f64::MIN;
    let mut worst_pct = 0.0_f64;
    let mut worst_abs = 0.0_f64;
    for point in equity_curve {
        peak = peak.max(point.equity);
        let dd_abs = peak - point.equity;
        let dd_pct = safe_div(dd_abs, peak);
        worst_abs = worst_abs.max(dd_abs);
        worst_pct = worst_pct.max(dd_pct);
    }
    (worst_pct, worst_abs)
}

/// Sharpe over per-step equity returns. 0 when equity never changes.
pub fn sharpe(equity_curve: &[EquityPoint]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| safe_div(w[1].equity - w[0].equity, w[0].equity))
        .collect();
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean(&returns) / std
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use edgelab_core::domain::PositionSide;

    fn point(i: i64, equity: f64) -> EquityPoint {
        EquityPoint {
            time: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + chrono::Duration::hours(i),
            equity,
        }
    }

    fn trade(pnl: f64, pnl_pct: f64, reason: ExitReason) -> Trade {
        let entry = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        Trade {
            symbol: "BTC/USDT".into(),
            side: PositionSide::Long,
            entry_time: entry,
            entry_price: 100.0,
            exit_time: entry + chrono::Duration::minutes(60),
            exit_price: 100.0 + pnl,
            quantity: 1.0,
            pnl,
            pnl_pct,
            exit_reason: reason,
        }
    }

    #[test]
    fn empty_ledger_is_all_zeros() {
        let m = Metrics::compute(&[], 1000.0, &[]);
        assert_eq!(m.total_trades, 0);
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.profit_factor, 0.0);
        assert_eq!(m.sharpe, 0.0);
        assert_eq!(m.max_drawdown_pct, 0.0);
        assert_eq!(m.total_return, 0.0);
        assert_eq!(m.avg_hold_minutes, 0.0);
        assert_eq!(m.best_trade_pct, 0.0);
        assert_eq!(m.worst_trade_pct, 0.0);
    }

    #[test]
    fn wins_plus_losses_partition_trades() {
        let trades = vec![
            trade(10.0, 0.10, ExitReason::TakeProfit),
            trade(-5.0, -0.05, ExitReason::StopLoss),
            trade(3.0, 0.03, ExitReason::RoiTable),
        ];
        let m = Metrics::compute(&trades, 1000.0, &[]);
        assert_eq!(m.wins + m.losses, m.total_trades);
        assert!((m.win_rate - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn all_wins_profit_factor_is_infinite() {
        let trades = vec![trade(10.0, 0.10, ExitReason::TakeProfit)];
        let m = Metrics::compute(&trades, 1000.0, &[]);
        assert!(m.profit_factor.is_infinite());
    }

    #[test]
    fn all_losses_profit_factor_is_zero() {
        let trades = vec![trade(-10.0, -0.10, ExitReason::StopLoss)];
        let m = Metrics::compute(&trades, 1000.0, &[]);
        assert_eq!(m.profit_factor, 0.0);
    }

    #[test]
    fn known_drawdown_curve() {
        let curve: Vec<EquityPoint> = [1000.0, 1500.0, 2000.0, 1500.0, 1000.0]
            .iter()
            .enumerate()
            .map(|(i, &e)| point(i as i64, e))
            .collect();
        let (pct, abs) = max_drawdown(&curve);
        assert!((pct - 0.5).abs() < 1e-12);
        assert!((abs - 1000.0).abs() < 1e-12);
    }

    #[test]
    fn flat_equity_sharpe_is_zero() {
        let curve: Vec<EquityPoint> = (0..10).map(|i| point(i, 1000.0)).collect();
        assert_eq!(sharpe(&curve), 0.0);
    }

    #[test]
    fn rising_equity_sharpe_positive() {
        let curve: Vec<EquityPoint> = (0..10)
            .map(|i| point(i, 1000.0 + 7.0 * i as f64 + (i % 3) as f64))
            .collect();
        assert!(sharpe(&curve) > 0.0);
    }

    #[test]
    fn exit_reason_counts() {
        let trades = vec![
            trade(10.0, 0.10, ExitReason::TakeProfit),
            trade(-5.0, -0.05, ExitReason::StopLoss),
            trade(-2.0, -0.02, ExitReason::StopLoss),
        ];
        let m = Metrics::compute(&trades, 1000.0, &[]);
        assert_eq!(m.exit_reasons[&ExitReason::StopLoss], 2);
        assert_eq!(m.exit_reasons[&ExitReason::TakeProfit], 1);
    }

    #[test]
    fn all_losing_ledger_reports_its_least_bad_trade() {
        let trades = vec![
            trade(-5.0, -0.05, ExitReason::StopLoss),
            trade(-2.0, -0.02, ExitReason::StopLoss),
        ];
        let m = Metrics::compute(&trades, 1000.0, &[]);
        assert_eq!(m.best_trade_pct, -0.02);
        assert_eq!(m.worst_trade_pct, -0.05);
    }

    #[test]
    fn all_winning_ledger_reports_its_smallest_win() {
        let trades = vec![
            trade(5.0, 0.05, ExitReason::TakeProfit),
            trade(2.0, 0.02, ExitReason::TakeProfit),
        ];
        let m = Metrics::compute(&trades, 1000.0, &[]);
        assert_eq!(m.best_trade_pct, 0.05);
        assert_eq!(m.worst_trade_pct, 0.02);
    }

    #[test]
    fn best_and_worst_trade() {
        let trades = vec![
            trade(10.0, 0.10, ExitReason::TakeProfit),
            trade(-5.0, -0.05, ExitReason::StopLoss),
        ];
        let m = Metrics::compute(&trades, 1000.0, &[]);
        assert_eq!(m.best_trade_pct, 0.10);
        assert_eq!(m.worst_trade_pct, -0.05);
    }
}
