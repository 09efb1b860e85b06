//! Risk gates for opening signals.
//!
//! Evaluation order is fixed: regime, risk-reward, correlation, protection.
//! Any rejection short-circuits with its reason. Closing signals and
//! no-action ticks bypass every gate unconditionally.

pub mod correlation;
pub mod protection;
pub mod risk_reward;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::StrategyConfig;
use crate::domain::{Candle, Signal, Trade};
use crate::regime::{apply_regime, Regime, RegimeVerdict};

pub use risk_reward::PivotLevels;

/// Outcome of the risk-gate chain.
///
/// `size_ratio` composes by taking the minimum of every gate's proposal,
/// not by multiplying reductions. (Preserved from the source behavior;
/// flagged as possibly unintended, so it lives in exactly one place: here.)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskDecision {
    pub approved: bool,
    pub reason: Option<String>,
    pub size_ratio: f64,
}

impl RiskDecision {
    pub fn pass() -> Self {
        Self {
            approved: true,
            reason: None,
            size_ratio: 1.0,
        }
    }

    pub fn reject(reason: String) -> Self {
        Self {
            approved: false,
            reason: Some(reason),
            size_ratio: 0.0,
        }
    }
}

/// Everything the gates need beyond the signal itself. All optional inputs
/// degrade to "no filtering" when absent.
pub struct RiskInputs<'a> {
    /// The candidate symbol's own candle window.
    pub candles: &'a [Candle],
    /// Externally-supplied pivot levels for the risk-reward gate.
    pub pivots: Option<PivotLevels>,
    /// Candle histories of currently-held symbols.
    pub held: Option<&'a HashMap<String, Vec<Candle>>>,
    /// Recently closed trades for the protection manager.
    pub recent_trades: &'a [Trade],
    pub now: DateTime<Utc>,
}

/// Run an opening signal through the full gate chain.
pub fn evaluate_entry(
    signal: &Signal,
    regime: &Regime,
    inputs: &RiskInputs<'_>,
    config: &StrategyConfig,
) -> RiskDecision {
    if !signal.direction.is_entry() {
        return RiskDecision::pass();
    }

    let mut size_ratio = 1.0_f64;

    // 1. Regime.
    match apply_regime(regime, signal, &config.regime) {
        RegimeVerdict::Pass => {}
        RegimeVerdict::Resize(ratio) => size_ratio = size_ratio.min(ratio),
        RegimeVerdict::Reject(reason) => return RiskDecision::reject(reason),
    }

    // 2. Risk-reward.
    if let risk_reward::RrVerdict::Reject(reason) = risk_reward::check(
        signal.direction,
        signal.price,
        inputs.candles,
        inputs.pivots,
        config.risk.sr_window,
        config.risk.min_rr,
    ) {
        return RiskDecision::reject(reason);
    }

    // 3. Correlation: shrink only, never reject.
    if let Some(held) = inputs.held {
        let (ratio, _trigger) = correlation::size_adjustment(
            inputs.candles,
            held,
            config.risk.correlation_threshold,
        );
        size_ratio = size_ratio.min(ratio);
    }

    // 4. Protection.
    let candle_width = inputs
        .candles
        .last()
        .map(|c| c.width_minutes())
        .unwrap_or(0);
    if let protection::ProtectionVerdict::Reject(reason) = protection::check(
        &signal.symbol,
        inputs.recent_trades,
        &config.protection,
        candle_width,
        inputs.now,
    ) {
        return RiskDecision::reject(reason);
    }

    RiskDecision {
        approved: true,
        reason: None,
        size_ratio,
    }
}
