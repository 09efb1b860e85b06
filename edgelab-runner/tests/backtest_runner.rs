//! End-to-end backtest tests over synthetic candle data.
//!
//! Tests:
//! 1. A cyclic market produces multiple round-trip trades
//! 2. Trade accounting balances against the equity curve
//! 3. Exit reasons respect the lifecycle priority order
//! 4. ROI table exits fire on time-decayed profit

use chrono::{Duration, TimeZone, Utc};
use std::collections::BTreeMap;

use edgelab_core::config::{RegimeConfig, RiskConfig, StrategyConfig, StrategyMode, TrailingConfig};
use edgelab_core::domain::{Candle, ExitReason};
use edgelab_core::signal::StrategyRegistry;
use edgelab_runner::{BacktestConfig, BacktestRunner};

fn make_candles(closes: &[f64]) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open_time = start + Duration::minutes(15 * i as i64);
            Candle {
                open_time,
                close_time: open_time + Duration::minutes(15),
                open: close,
                high: close * 1.002,
                low: close * 0.998,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// A slow sine wave around 100: MA crossovers fire on every half-cycle.
fn cyclic_series(bars: usize) -> Vec<Candle> {
    let closes: Vec<f64> = (0..bars)
        .map(|i| 100.0 + 15.0 * (i as f64 / 40.0).sin())
        .collect();
    make_candles(&closes)
}

fn crossover_strategy() -> StrategyConfig {
    StrategyConfig {
        mode: StrategyMode::RuleBased,
        buy_conditions: vec!["golden_cross".into()],
        sell_conditions: vec!["death_cross".into()],
        stop_loss_pct: 0.0,
        take_profit_pct: 0.0,
        minimal_roi: BTreeMap::new(),
        trailing: TrailingConfig {
            enabled: false,
            ..Default::default()
        },
        risk: RiskConfig {
            min_rr: 0.0,
            ..Default::default()
        },
        // Exercise the crossover logic in isolation.
        regime: RegimeConfig {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn frictionless() -> BacktestConfig {
    BacktestConfig {
        fee_rate: 0.0,
        slippage_pct: 0.0,
        spread_bps: 0.0,
        ..Default::default()
    }
}

#[test]
fn cyclic_market_produces_round_trips() {
    let registry = StrategyRegistry::new();
    let runner = BacktestRunner::new(&registry, frictionless());
    let candles = cyclic_series(600);
    let result = runner
        .run("BTC/USDT", &candles, &crossover_strategy())
        .unwrap();
    assert!(
        result.trades.len() >= 2,
        "expected repeated crossovers, got {} trades",
        result.trades.len()
    );
    for trade in &result.trades {
        assert!(trade.exit_time >= trade.entry_time);
        assert!(trade.quantity > 0.0);
    }
}

#[test]
fn ledger_balances_against_equity_curve() {
    let registry = StrategyRegistry::new();
    let config = BacktestConfig {
        initial_equity: 10_000.0,
        ..frictionless()
    };
    let runner = BacktestRunner::new(&registry, config);
    let candles = cyclic_series(600);
    let result = runner
        .run("BTC/USDT", &candles, &crossover_strategy())
        .unwrap();
    let total_pnl: f64 = result.trades.iter().map(|t| t.pnl).sum();
    let final_equity = result.equity_curve.last().map(|p| p.equity).unwrap();
    assert!(
        (final_equity - (10_000.0 + total_pnl)).abs() < 1e-6,
        "final equity {final_equity} vs initial + pnl {}",
        10_000.0 + total_pnl
    );
}

#[test]
fn stop_loss_beats_signal_exit_on_the_same_series() {
    let registry = StrategyRegistry::new();
    let runner = BacktestRunner::new(&registry, frictionless());
    let mut strategy = crossover_strategy();
    strategy.stop_loss_pct = 0.02;
    let candles = cyclic_series(600);
    let result = runner.run("BTC/USDT", &candles, &strategy).unwrap();
    // A 2% stop inside a 15% swing must fire before any death cross.
    assert!(result
        .trades
        .iter()
        .any(|t| t.exit_reason == ExitReason::StopLoss));
}

#[test]
fn roi_table_takes_profit_early() {
    let registry = StrategyRegistry::new();
    let runner = BacktestRunner::new(&registry, frictionless());
    let mut strategy = crossover_strategy();
    // Immediate exit once any profit exists.
    strategy.minimal_roi = BTreeMap::from([(0u32, 0.01)]);
    let candles = cyclic_series(600);
    let result = runner.run("BTC/USDT", &candles, &strategy).unwrap();
    assert!(result
        .trades
        .iter()
        .any(|t| t.exit_reason == ExitReason::RoiTable));
    for trade in result
        .trades
        .iter()
        .filter(|t| t.exit_reason == ExitReason::RoiTable)
    {
        assert!(trade.pnl_pct >= 0.0);
    }
}

#[test]
fn time_stop_caps_holding_period() {
    let registry = StrategyRegistry::new();
    let runner = BacktestRunner::new(&registry, frictionless());
    let mut strategy = crossover_strategy();
    strategy.max_hold_minutes = 120;
    let candles = cyclic_series(600);
    let result = runner.run("BTC/USDT", &candles, &strategy).unwrap();
    for trade in &result.trades {
        if trade.exit_reason == ExitReason::TimeStop {
            assert!(trade.held_minutes() >= 120);
        }
        // Nothing signal-driven may run longer than the cap plus one bar.
        assert!(trade.held_minutes() <= 135, "held {}", trade.held_minutes());
    }
}
