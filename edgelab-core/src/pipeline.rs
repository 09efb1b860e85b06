//! Single-tick pipeline entry point.
//!
//! `process_signal` chains indicators, regime, detection, and the risk
//! gates for one symbol on one tick. It is the one call shared by live
//! monitoring loops and the backtest runner, and it is deterministic:
//! identical inputs produce identical outcomes, with all timestamps taken
//! from the candle data rather than the wall clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::StrategyConfig;
use crate::domain::{Candle, Direction, PositionSide, Signal, Trade};
use crate::error::SignalError;
use crate::indicators::{compute_snapshot, IndicatorSnapshot};
use crate::regime::{classify, RegimeLabel};
use crate::risk::{evaluate_entry, PivotLevels, RiskDecision, RiskInputs};
use crate::signal::{build_detector, StrategyRegistry};
use crate::state::StateStore;

/// Externally-sourced market context merged into the snapshot before
/// detection. All optional; absence simply leaves the corresponding rule
/// conditions inert.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExternalMarketData {
    pub order_flow_delta: Option<f64>,
    pub funding_rate: Option<f64>,
    pub dominance: Option<f64>,
}

/// Collaborator-supplied context for one `process_signal` call.
pub struct PipelineContext<'a> {
    pub registry: &'a StrategyRegistry,
    pub state: &'a dyn StateStore,
    /// Side currently held for this symbol, if any.
    pub current_side: Option<PositionSide>,
    /// Candle histories of currently-held symbols, for the correlation gate.
    pub held: Option<&'a HashMap<String, Vec<Candle>>>,
    /// Externally-supplied pivot levels for the risk-reward gate.
    pub pivots: Option<PivotLevels>,
    pub externals: ExternalMarketData,
}

/// Everything a caller needs to act on one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickOutcome {
    /// `None` when the window was too short to warm up the indicators.
    pub indicators: Option<IndicatorSnapshot>,
    pub signal: Signal,
    pub risk: RiskDecision,
    /// True when no trade may be opened this tick: either insufficient
    /// data or a risk-gate rejection.
    pub rejected: bool,
    pub rejection_reason: Option<String>,
    pub regime_label: RegimeLabel,
}

/// Run the full per-tick pipeline for one symbol.
///
/// The only hard error is an unknown pluggable-strategy id; every other
/// degenerate input is absorbed into the outcome fields.
pub fn process_signal(
    symbol: &str,
    candles: &[Candle],
    config: &StrategyConfig,
    ctx: &PipelineContext<'_>,
    recent_trades: &[Trade],
) -> Result<TickOutcome, SignalError> {
    let now = candles
        .last()
        .map(|c| c.close_time)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let last_price = candles.last().map(|c| c.close).unwrap_or(0.0);

    let Some(mut snapshot) = compute_snapshot(candles, &config.indicators) else {
        let reason = format!(
            "insufficient candle history: {} < warmup {}",
            candles.len(),
            config.indicators.warmup()
        );
        return Ok(TickOutcome {
            indicators: None,
            signal: Signal::none(symbol, last_price, IndicatorSnapshot::default(), now),
            risk: RiskDecision::reject(reason.clone()),
            rejected: true,
            rejection_reason: Some(reason),
            regime_label: RegimeLabel::Unknown,
        });
    };

    snapshot.order_flow_delta = ctx.externals.order_flow_delta;
    snapshot.funding_rate = ctx.externals.funding_rate;
    snapshot.dominance = ctx.externals.dominance;

    let detector = build_detector(config, ctx.registry)?;
    let signal = detector.detect(symbol, &snapshot, config, ctx.current_side, ctx.state, now);

    let regime = classify(candles);

    let risk = if signal.direction.is_entry() {
        let inputs = RiskInputs {
            candles,
            pivots: ctx.pivots,
            held: ctx.held,
            recent_trades,
            now,
        };
        evaluate_entry(&signal, &regime, &inputs, config)
    } else {
        RiskDecision::pass()
    };

    let rejected = signal.direction.is_entry() && !risk.approved;
    Ok(TickOutcome {
        indicators: Some(snapshot),
        rejection_reason: if rejected { risk.reason.clone() } else { None },
        signal,
        risk,
        rejected,
        regime_label: regime.label,
    })
}

impl TickOutcome {
    /// Does this outcome call for opening a position?
    pub fn opens_position(&self) -> bool {
        !self.rejected && self.signal.direction.is_entry() && self.risk.approved
    }

    pub fn closes_position(&self) -> bool {
        matches!(self.signal.direction, Direction::Sell | Direction::Cover)
    }
}
