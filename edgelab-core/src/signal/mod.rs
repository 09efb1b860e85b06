//! Signal detection — rule lists, pluggable strategies, ensembles.
//!
//! One contract (`SignalDetector`) with three implementations selected by
//! `StrategyMode`. Detector construction is the only fallible step: an
//! unknown plugin id fails fast there, so `detect` itself is infallible.

pub mod conditions;
pub mod ensemble;
pub mod registry;
pub mod strategy;

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::{StrategyConfig, StrategyMode};
use crate::domain::{Direction, Position, PositionSide, Signal};
use crate::error::SignalError;
use crate::indicators::IndicatorSnapshot;
use crate::state::StateStore;

pub use ensemble::{DirectionScores, Ensemble, EnsembleVote};
pub use registry::{StrategyRegistry, DEFAULT_STRATEGY_ID};
pub use strategy::{Strategy, StrategyContext};

/// One-tick signal detection for a symbol.
pub trait SignalDetector: Send + Sync {
    fn detect(
        &self,
        symbol: &str,
        snapshot: &IndicatorSnapshot,
        config: &StrategyConfig,
        current_side: Option<PositionSide>,
        state: &dyn StateStore,
        now: DateTime<Utc>,
    ) -> Signal;

    /// Custom exit override, consulted by the lifecycle simulator before
    /// its standard checks. Only plugin strategies implement this.
    fn should_exit(
        &self,
        _position: &Position,
        _price: f64,
        _snapshot: &IndicatorSnapshot,
    ) -> Option<String> {
        None
    }
}

/// Build the detector selected by `config.mode`.
///
/// The only hard failure: a `Plugin` id (other than `"default"`) with no
/// registry entry. Ensemble members are resolved leniently inside
/// `Ensemble::from_config`.
pub fn build_detector(
    config: &StrategyConfig,
    registry: &StrategyRegistry,
) -> Result<Box<dyn SignalDetector>, SignalError> {
    match &config.mode {
        StrategyMode::RuleBased => Ok(Box::new(RuleBasedDetector)),
        StrategyMode::Plugin { id } if id == DEFAULT_STRATEGY_ID => {
            Ok(Box::new(RuleBasedDetector))
        }
        StrategyMode::Plugin { id } => {
            let strategy = registry.resolve(id)?;
            Ok(Box::new(PluginDetector { strategy }))
        }
        StrategyMode::Ensemble(cfg) => Ok(Box::new(EnsembleDetector {
            ensemble: Ensemble::from_config(cfg, registry),
        })),
    }
}

/// Evaluates the configured condition lists with AND semantics.
///
/// Direction order is fixed: buy, sell, short, cover; the first direction
/// whose full list holds wins. Entries are only considered when flat, exits
/// only when holding the matching side.
pub struct RuleBasedDetector;

impl SignalDetector for RuleBasedDetector {
    fn detect(
        &self,
        symbol: &str,
        snapshot: &IndicatorSnapshot,
        config: &StrategyConfig,
        current_side: Option<PositionSide>,
        _state: &dyn StateStore,
        now: DateTime<Utc>,
    ) -> Signal {
        let candidates: [(Direction, &[String], bool); 4] = [
            (Direction::Buy, &config.buy_conditions, current_side.is_none()),
            (
                Direction::Sell,
                &config.sell_conditions,
                current_side == Some(PositionSide::Long),
            ),
            (
                Direction::Short,
                &config.short_conditions,
                current_side.is_none() && config.enable_short,
            ),
            (
                Direction::Cover,
                &config.cover_conditions,
                current_side == Some(PositionSide::Short),
            ),
        ];

        for (direction, names, eligible) in candidates {
            if !eligible {
                continue;
            }
            if let Some(satisfied) = conditions::evaluate_all(names, snapshot) {
                return Signal {
                    symbol: symbol.to_string(),
                    direction,
                    price: snapshot.close,
                    indicators: snapshot.clone(),
                    reasons: satisfied,
                    timestamp: now,
                };
            }
        }

        none_signal(symbol, snapshot, now)
    }
}

/// Delegates to one registry strategy.
struct PluginDetector {
    strategy: Arc<dyn Strategy>,
}

impl SignalDetector for PluginDetector {
    fn detect(
        &self,
        symbol: &str,
        snapshot: &IndicatorSnapshot,
        config: &StrategyConfig,
        current_side: Option<PositionSide>,
        state: &dyn StateStore,
        now: DateTime<Utc>,
    ) -> Signal {
        let mut enriched = snapshot.clone();
        self.strategy.populate_indicators(&mut enriched);

        let ctx = StrategyContext {
            symbol,
            snapshot: &enriched,
            config,
            current_side,
            state,
        };
        let direction = self.strategy.populate_signal(&ctx);
        if direction == Direction::None {
            return none_signal(symbol, &enriched, now);
        }

        Signal {
            symbol: symbol.to_string(),
            direction,
            price: enriched.close,
            indicators: enriched,
            reasons: vec![self.strategy.id().to_string()],
            timestamp: now,
        }
    }

    fn should_exit(
        &self,
        position: &Position,
        price: f64,
        snapshot: &IndicatorSnapshot,
    ) -> Option<String> {
        self.strategy.should_exit(position, price, snapshot)
    }
}

/// Weighted vote over several registry strategies.
struct EnsembleDetector {
    ensemble: Ensemble,
}

impl SignalDetector for EnsembleDetector {
    fn detect(
        &self,
        symbol: &str,
        snapshot: &IndicatorSnapshot,
        config: &StrategyConfig,
        current_side: Option<PositionSide>,
        state: &dyn StateStore,
        now: DateTime<Utc>,
    ) -> Signal {
        let ctx = StrategyContext {
            symbol,
            snapshot,
            config,
            current_side,
            state,
        };
        let vote = self.ensemble.vote(&ctx);
        if vote.direction == Direction::None {
            return none_signal(symbol, snapshot, now);
        }

        Signal {
            symbol: symbol.to_string(),
            direction: vote.direction,
            price: snapshot.close,
            indicators: snapshot.clone(),
            reasons: vote
                .supporters
                .iter()
                .map(|id| format!("ensemble:{id}"))
                .collect(),
            timestamp: now,
        }
    }
}

fn none_signal(symbol: &str, snapshot: &IndicatorSnapshot, now: DateTime<Utc>) -> Signal {
    Signal {
        symbol: symbol.to_string(),
        direction: Direction::None,
        price: snapshot.close,
        indicators: snapshot.clone(),
        reasons: Vec::new(),
        timestamp: now,
    }
}
