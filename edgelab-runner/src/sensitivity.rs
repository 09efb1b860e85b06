//! Parameter sensitivity sweeps.
//!
//! Re-runs the same backtest with one named parameter swept across a value
//! list, in parallel, and reports how stable the outcome is. A strategy
//! whose profitability collapses when a parameter moves a notch is fit to
//! noise, not structure.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use edgelab_core::config::StrategyConfig;
use edgelab_core::domain::Candle;
use edgelab_core::signal::StrategyRegistry;

use crate::backtest::{BacktestConfig, BacktestRunner};
use crate::walk_forward::ValidationError;

/// One sweep: a named parameter and the values to try.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityConfig {
    pub parameter: String,
    pub values: Vec<f64>,
}

/// Outcome of a single parameter value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub value: f64,
    pub total_return: f64,
    pub profit_factor: f64,
    pub trades: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub parameter: String,
    pub points: Vec<SensitivityPoint>,
    /// Fraction of swept values that stayed profitable.
    pub robust_pct: f64,
}

/// Apply one named parameter to a strategy config.
///
/// Period parameters truncate the value to an integer. Unknown names are a
/// hard error so a typo cannot silently sweep nothing.
pub fn apply_parameter(
    config: &mut StrategyConfig,
    name: &str,
    value: f64,
) -> Result<(), ValidationError> {
    match name {
        "stop_loss_pct" => config.stop_loss_pct = value,
        "take_profit_pct" => config.take_profit_pct = value,
        "min_rr" => config.risk.min_rr = value,
        "correlation_threshold" => config.risk.correlation_threshold = value,
        "trailing_callback_pct" => config.trailing.callback_pct = value,
        "trailing_offset_pct" => config.trailing.offset_pct = value,
        "short_ma" => config.indicators.short_ma = value as usize,
        "long_ma" => config.indicators.long_ma = value as usize,
        "rsi_period" => config.indicators.rsi_period = value as usize,
        other => return Err(ValidationError::UnknownParameter(other.to_string())),
    }
    Ok(())
}

/// Sweep one parameter across its values, one backtest each, in parallel.
pub fn run(
    symbol: &str,
    candles: &[Candle],
    base: &StrategyConfig,
    registry: &StrategyRegistry,
    backtest: &BacktestConfig,
    sweep: &SensitivityConfig,
) -> Result<SensitivityReport, ValidationError> {
    // Validate the parameter name up front so the sweep fails before any
    // work is spent.
    let mut scratch = base.clone();
    apply_parameter(&mut scratch, &sweep.parameter, 0.0)?;

    let points: Result<Vec<SensitivityPoint>, ValidationError> = sweep
        .values
        .par_iter()
        .map(|&value| {
            let mut config = base.clone();
            apply_parameter(&mut config, &sweep.parameter, value)?;
            let runner = BacktestRunner::new(registry, backtest.clone());
            let result = runner
                .run(symbol, candles, &config)
                .map_err(|source| ValidationError::BacktestFailed { fold: 0, source })?;
            Ok(SensitivityPoint {
                value,
                total_return: result.metrics.total_return,
                profit_factor: result.metrics.profit_factor,
                trades: result.trades.len(),
            })
        })
        .collect();
    let points = points?;

    let profitable = points.iter().filter(|p| p.total_return > 0.0).count();
    let robust_pct = if points.is_empty() {
        0.0
    } else {
        profitable as f64 / points.len() as f64
    };

    Ok(SensitivityReport {
        parameter: sweep.parameter.clone(),
        points,
        robust_pct,
    })
}
