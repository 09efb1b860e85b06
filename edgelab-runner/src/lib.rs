//! EdgeLab Runner — backtest orchestration, metrics, and validation.
//!
//! This crate builds on `edgelab-core` to provide:
//! - Candle-replay backtest runner with a fee/slippage/spread cost model
//! - Performance metrics over trade ledgers and equity curves
//! - Walk-forward validation with rolling train/test folds
//! - Parameter sensitivity sweeps (rayon-parallel)
//! - Monte-Carlo trade-order shuffling with drawdown tail statistics
//! - JSON artifact export for runs and reports

pub mod backtest;
pub mod metrics;
pub mod monte_carlo;
pub mod report;
pub mod sensitivity;
pub mod walk_forward;

pub use backtest::{BacktestConfig, BacktestError, BacktestResult, BacktestRunner, EquityPoint};
pub use metrics::Metrics;
pub use monte_carlo::{MonteCarloConfig, MonteCarloReport};
pub use sensitivity::{SensitivityConfig, SensitivityPoint, SensitivityReport};
pub use walk_forward::{
    FoldResult, FoldSpec, ValidationError, WalkForwardConfig, WalkForwardReport,
};
