//! edgelab-core — the signal-and-risk pipeline.
//!
//! This crate contains the per-tick decision logic:
//! - Domain types (candles, signals, positions, trades)
//! - Indicator engine producing current + previous-period snapshots
//! - Regime classifier with confidence-gated signal filtering
//! - Signal detection: rule lists, pluggable strategies, weighted ensembles
//! - Risk gates (regime, risk-reward, correlation, protection)
//! - Position lifecycle exit state machine (stops, ROI table, trailing)
//! - The single-tick `process_signal` entry point shared by live loops and
//!   the backtest runner in `edgelab-runner`
//!
//! Everything here is synchronous, allocation-light, and deterministic:
//! identical inputs always produce identical outcomes.

pub mod config;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod lifecycle;
pub mod numeric;
pub mod pipeline;
pub mod regime;
pub mod risk;
pub mod signal;
pub mod state;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: pipeline types cross thread boundaries, so the
    /// parallel validators in the runner can fan out without retrofits.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Candle>();
        require_sync::<domain::Candle>();
        require_send::<domain::Signal>();
        require_sync::<domain::Signal>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::Trade>();
        require_sync::<domain::Trade>();

        require_send::<indicators::IndicatorSnapshot>();
        require_sync::<indicators::IndicatorSnapshot>();
        require_send::<regime::Regime>();
        require_sync::<regime::Regime>();
        require_send::<risk::RiskDecision>();
        require_sync::<risk::RiskDecision>();
        require_send::<pipeline::TickOutcome>();
        require_sync::<pipeline::TickOutcome>();

        require_send::<config::StrategyConfig>();
        require_sync::<config::StrategyConfig>();
        require_send::<signal::StrategyRegistry>();
        require_sync::<signal::StrategyRegistry>();
        require_send::<state::MemoryStateStore>();
        require_sync::<state::MemoryStateStore>();
    }
}
