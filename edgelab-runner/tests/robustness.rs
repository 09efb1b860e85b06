//! End-to-end validation tests: walk-forward, sensitivity, Monte-Carlo.

use chrono::{Duration, TimeZone, Utc};
use std::collections::BTreeMap;

use edgelab_core::config::{RegimeConfig, RiskConfig, StrategyConfig, StrategyMode};
use edgelab_core::domain::Candle;
use edgelab_core::signal::StrategyRegistry;
use edgelab_runner::{
    monte_carlo, sensitivity, walk_forward, BacktestConfig, BacktestRunner, MonteCarloConfig,
    SensitivityConfig, WalkForwardConfig,
};

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
        risk: RiskConfig {
            min_rr: 0.0,
            ..Default::default()
        },
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
fn walk_forward_runs_all_folds() {
    let registry = StrategyRegistry::new();
    let candles = cyclic_series(2000);
    let report = walk_forward::run(
        "BTC/USDT",
        &candles,
        &crossover_strategy(),
        &registry,
        &frictionless(),
        &WalkForwardConfig::default(),
    )
    .unwrap();
    assert_eq!(report.folds.len(), 5);
    assert!(report.consistency >= 0.0 && report.consistency <= 1.0);
    for fold in &report.folds {
        assert!(fold.train_trades >= fold.test_trades);
    }
}

#[test]
fn walk_forward_rejects_short_series() {
    let registry = StrategyRegistry::new();
    let candles = cyclic_series(100);
    let err = walk_forward::run(
        "BTC/USDT",
        &candles,
        &crossover_strategy(),
        &registry,
        &frictionless(),
        &WalkForwardConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        walk_forward::ValidationError::InsufficientData { .. }
    ));
}

#[test]
fn sensitivity_sweep_covers_every_value() {
    let registry = StrategyRegistry::new();
    let candles = cyclic_series(600);
    let sweep = SensitivityConfig {
        parameter: "stop_loss_pct".into(),
        values: vec![0.02, 0.05, 0.10],
    };
    let report = sensitivity::run(
        "BTC/USDT",
        &candles,
        &crossover_strategy(),
        &registry,
        &frictionless(),
        &sweep,
    )
    .unwrap();
    assert_eq!(report.points.len(), 3);
    assert!(report.robust_pct >= 0.0 && report.robust_pct <= 1.0);
    let values: Vec<f64> = report.points.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![0.02, 0.05, 0.10]);
}

#[test]
fn sensitivity_rejects_unknown_parameter_before_running() {
    let registry = StrategyRegistry::new();
    let candles = cyclic_series(600);
    let sweep = SensitivityConfig {
        parameter: "quantum_flux".into(),
        values: vec![1.0],
    };
    assert!(matches!(
        sensitivity::run(
            "BTC/USDT",
            &candles,
            &crossover_strategy(),
            &registry,
            &frictionless(),
            &sweep,
        ),
        Err(walk_forward::ValidationError::UnknownParameter(_))
    ));
}

#[test]
fn monte_carlo_summarizes_backtest_trades() {
    let registry = StrategyRegistry::new();
    let runner = BacktestRunner::new(&registry, frictionless());
    let candles = cyclic_series(600);
    let result = runner
        .run("BTC/USDT", &candles, &crossover_strategy())
        .unwrap();
    assert!(!result.trades.is_empty());

    let report = monte_carlo::run(&result.trades, &MonteCarloConfig::default());
    assert_eq!(report.iterations, 1000);
    assert!(report.p5_return <= report.median_return);
    assert!(report.median_return <= report.p95_return);
    assert!(report.tail_max_drawdown >= 0.0);
}
