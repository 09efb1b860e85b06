//! Walk-forward validation — rolling train/test folds.
//!
//! Splits the candle series into rolling windows, each divided into a
//! train segment and an out-of-sample (OOS) test segment. The strategy is
//! backtested on both segments per fold; the verdict compares in-sample
//! performance against what held up out of sample.
//!
//! A strategy is reported robust when the average OOS return is positive
//! and at least 60% of folds were profitable out of sample.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use edgelab_core::config::StrategyConfig;
use edgelab_core::domain::Candle;
use edgelab_core::numeric::mean;
use edgelab_core::signal::StrategyRegistry;

use crate::backtest::{BacktestConfig, BacktestError, BacktestRunner};

/// Fraction of profitable OOS folds required for a robust verdict.
pub const CONSISTENCY_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardConfig {
    /// Number of rolling folds (default 5).
    pub n_folds: usize,
    /// Fraction of each fold window used for training (default 0.7).
    pub train_ratio: f64,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            n_folds: 5,
            train_ratio: 0.7,
        }
    }
}

/// Bar index ranges for one fold. Train is `[start, split)`, test is
/// `[split, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FoldSpec {
    pub fold_index: usize,
    pub start: usize,
    pub split: usize,
    pub end: usize,
}

/// Per-fold outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldResult {
    pub fold_index: usize,
    pub train_return: f64,
    pub test_return: f64,
    pub train_trades: usize,
    pub test_trades: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardReport {
    pub folds: Vec<FoldResult>,
    pub avg_train_return: f64,
    pub avg_test_return: f64,
    /// Fraction of folds with a positive OOS return.
    pub consistency: f64,
    pub robust: bool,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("insufficient data: {total_bars} bars, need at least {required}")]
    InsufficientData { total_bars: usize, required: usize },
    #[error("cannot fit {n_folds} folds in {total_bars} bars")]
    FoldCreationFailed { n_folds: usize, total_bars: usize },
    #[error("backtest failed on fold {fold}: {source}")]
    BacktestFailed {
        fold: usize,
        #[source]
        source: BacktestError,
    },
    #[error("unknown sweep parameter: {0}")]
    UnknownParameter(String),
}

/// Create rolling fold specifications.
///
/// Test segments tile the series without overlap; each fold's train
/// segment is the preceding window, so consecutive folds share most of
/// their training data. Every segment must be able to warm the indicators
/// up, which sets the minimum series length.
pub fn create_folds(
    total_bars: usize,
    warmup: usize,
    config: &WalkForwardConfig,
) -> Result<Vec<FoldSpec>, ValidationError> {
    let n = config.n_folds.max(1);
    let train_ratio = config.train_ratio.clamp(0.1, 0.9);
    let test_frac = 1.0 - train_ratio;

    // total = n * test_len + train_len, with train_len / test_len fixed by
    // the ratio. Solve for test_len.
    let test_len =
        (total_bars as f64 * test_frac / (train_ratio + n as f64 * test_frac)) as usize;
    let train_len = total_bars.saturating_sub(n * test_len);

    // Both segments are backtested standalone, so each must cover warmup
    // plus room for at least a few decisions.
    let min_segment = warmup + 10;
    if test_len < min_segment || train_len < min_segment {
        let required = min_segment * (n + 3);
        if total_bars < required {
            return Err(ValidationError::InsufficientData {
                total_bars,
                required,
            });
        }
        return Err(ValidationError::FoldCreationFailed {
            n_folds: n,
            total_bars,
        });
    }

    let mut folds = Vec::with_capacity(n);
    for i in 0..n {
        let start = i * test_len;
        let split = start + train_len;
        let end = split + test_len;
        if end > total_bars {
            break;
        }
        folds.push(FoldSpec {
            fold_index: i,
            start,
            split,
            end,
        });
    }
    if folds.is_empty() {
        return Err(ValidationError::FoldCreationFailed {
            n_folds: n,
            total_bars,
        });
    }
    Ok(folds)
}

/// Run walk-forward validation for one strategy over one candle series.
pub fn run(
    symbol: &str,
    candles: &[Candle],
    strategy: &StrategyConfig,
    registry: &StrategyRegistry,
    backtest: &BacktestConfig,
    config: &WalkForwardConfig,
) -> Result<WalkForwardReport, ValidationError> {
    let warmup = strategy.indicators.warmup();
    let folds = create_folds(candles.len(), warmup, config)?;
    let runner = BacktestRunner::new(registry, backtest.clone());

    let mut results = Vec::with_capacity(folds.len());
    for spec in &folds {
        let train = runner
            .run(symbol, &candles[spec.start..spec.split], strategy)
            .map_err(|source| ValidationError::BacktestFailed {
                fold: spec.fold_index,
                source,
            })?;
        let test = runner
            .run(symbol, &candles[spec.split..spec.end], strategy)
            .map_err(|source| ValidationError::BacktestFailed {
                fold: spec.fold_index,
                source,
            })?;
        results.push(FoldResult {
            fold_index: spec.fold_index,
            train_return: train.metrics.total_return,
            test_return: test.metrics.total_return,
            train_trades: train.trades.len(),
            test_trades: test.trades.len(),
        });
    }

    Ok(summarize(results))
}

/// Reduce fold results to the report and verdict.
pub fn summarize(folds: Vec<FoldResult>) -> WalkForwardReport {
    let train_returns: Vec<f64> = folds.iter().map(|f| f.train_return).collect();
    let test_returns: Vec<f64> = folds.iter().map(|f| f.test_return).collect();
    let avg_train_return = mean(&train_returns);
    let avg_test_return = mean(&test_returns);
    let profitable = folds.iter().filter(|f| f.test_return > 0.0).count();
    let consistency = if folds.is_empty() {
        0.0
    } else {
        profitable as f64 / folds.len() as f64
    };
    let robust = avg_test_return > 0.0 && consistency >= CONSISTENCY_THRESHOLD;
    WalkForwardReport {
        folds,
        avg_train_return,
        avg_test_return,
        consistency,
        robust,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold(i: usize, train: f64, test: f64) -> FoldResult {
        FoldResult {
            fold_index: i,
            train_return: train,
            test_return: test,
            train_trades: 10,
            test_trades: 4,
        }
    }

    #[test]
    fn folds_tile_the_series() {
        let config = WalkForwardConfig::default();
        let folds = create_folds(2000, 36, &config).unwrap();
        assert_eq!(folds.len(), 5);
        for pair in folds.windows(2) {
            // Test segments are contiguous and non-overlapping.
            assert_eq!(pair[0].start + (pair[0].end - pair[0].split), pair[1].start);
        }
        assert!(folds.last().map(|f| f.end).unwrap_or(0) <= 2000);
        for f in &folds {
            assert!(f.split - f.start > f.end - f.split, "train longer than test");
        }
    }

    #[test]
    fn too_few_bars_is_an_error() {
        let config = WalkForwardConfig::default();
        assert!(matches!(
            create_folds(100, 36, &config),
            Err(ValidationError::InsufficientData { .. })
        ));
    }

    #[test]
    fn all_profitable_folds_are_robust() {
        let report = summarize((0..5).map(|i| fold(i, 0.1, 0.05)).collect());
        assert!(report.robust);
        assert_eq!(report.consistency, 1.0);
    }

    #[test]
    fn three_of_five_profitable_meets_consistency() {
        let folds = vec![
            fold(0, 0.1, 0.05),
            fold(1, 0.1, 0.04),
            fold(2, 0.1, 0.02),
            fold(3, 0.1, -0.01),
            fold(4, 0.1, -0.01),
        ];
        let report = summarize(folds);
        assert!((report.consistency - 0.6).abs() < 1e-12);
        assert!(report.robust);
    }

    #[test]
    fn negative_average_oos_is_not_robust() {
        // Three folds barely positive, two deeply negative: consistency
        // passes but the average does not.
        let folds = vec![
            fold(0, 0.2, 0.01),
            fold(1, 0.2, 0.01),
            fold(2, 0.2, 0.01),
            fold(3, 0.2, -0.30),
            fold(4, 0.2, -0.30),
        ];
        let report = summarize(folds);
        assert!(report.consistency >= CONSISTENCY_THRESHOLD);
        assert!(report.avg_test_return < 0.0);
        assert!(!report.robust);
    }

    #[test]
    fn low_consistency_is_not_robust() {
        let folds = vec![
            fold(0, 0.2, 0.50),
            fold(1, 0.2, 0.40),
            fold(2, 0.2, -0.01),
            fold(3, 0.2, -0.01),
            fold(4, 0.2, -0.01),
        ];
        let report = summarize(folds);
        assert!(report.avg_test_return > 0.0);
        assert!(!report.robust);
    }
}
