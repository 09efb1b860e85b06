//! Ensemble voting — weighted aggregation of member strategies.
//!
//! Members are resolved from the registry once at construction and held as
//! (strategy, weight) pairs; a missing member id is skipped with a warning
//! rather than failing the whole ensemble. Weights are normalized to sum to
//! one at vote time, with a non-positive total clamped to 1 so degenerate
//! configs cannot produce NaN scores.

use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::EnsembleConfig;
use crate::domain::Direction;

use super::registry::StrategyRegistry;
use super::strategy::{Strategy, StrategyContext};

/// Per-direction weighted scores, all in [0, 1] after normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionScores {
    pub buy: f64,
    pub sell: f64,
    pub short: f64,
    pub cover: f64,
}

impl DirectionScores {
    fn add(&mut self, direction: Direction, weight: f64) {
        match direction {
            Direction::Buy => self.buy += weight,
            Direction::Sell => self.sell += weight,
            Direction::Short => self.short += weight,
            Direction::Cover => self.cover += weight,
            Direction::None => {}
        }
    }

    /// Highest-scoring direction, ties broken in buy/sell/short/cover order.
    fn leader(&self) -> (Direction, f64) {
        let ranked = [
            (Direction::Buy, self.buy),
            (Direction::Sell, self.sell),
            (Direction::Short, self.short),
            (Direction::Cover, self.cover),
        ];
        let mut best = (Direction::None, 0.0);
        for (dir, score) in ranked {
            if score > best.1 {
                best = (dir, score);
            }
        }
        best
    }
}

/// Outcome of one ensemble vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleVote {
    pub direction: Direction,
    pub scores: DirectionScores,
    /// Whether all non-abstaining members agreed. An empty vote is
    /// unanimous by convention.
    pub unanimous: bool,
    /// Ids of the members that voted for the winning direction.
    pub supporters: Vec<String>,
}

impl EnsembleVote {
    fn abstained() -> Self {
        Self {
            direction: Direction::None,
            scores: DirectionScores::default(),
            unanimous: true,
            supporters: Vec::new(),
        }
    }
}

/// A higher-order strategy voting over resolved members.
pub struct Ensemble {
    members: Vec<(Arc<dyn Strategy>, f64)>,
    threshold: f64,
    unanimous_mode: bool,
}

impl Ensemble {
    /// Build from config, resolving member ids against the registry.
    ///
    /// Missing members are skipped with a warning; only an entirely
    /// unresolvable config yields an ensemble that always abstains.
    pub fn from_config(cfg: &EnsembleConfig, registry: &StrategyRegistry) -> Self {
        let mut members = Vec::with_capacity(cfg.members.len());
        for member in &cfg.members {
            match registry.resolve(&member.id) {
                Ok(strategy) => members.push((strategy, member.weight)),
                Err(_) => {
                    warn!("ensemble member {:?} not in registry, skipping", member.id);
                }
            }
        }
        Self {
            members,
            threshold: cfg.threshold,
            unanimous_mode: cfg.unanimous,
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Run every member and aggregate weighted votes.
    pub fn vote(&self, ctx: &StrategyContext<'_>) -> EnsembleVote {
        if self.members.is_empty() {
            return EnsembleVote::abstained();
        }

        let total: f64 = self.members.iter().map(|(_, w)| w).sum();
        // A zero or negative total would poison every score; clamp to 1 so
        // the individual weights degrade gracefully instead.
        let total = if total > 0.0 { total } else { 1.0 };

        let mut scores = DirectionScores::default();
        let mut votes: Vec<(&str, Direction)> = Vec::with_capacity(self.members.len());
        for (strategy, weight) in &self.members {
            let direction = strategy.populate_signal(ctx);
            if direction != Direction::None {
                scores.add(direction, weight / total);
                votes.push((strategy.id(), direction));
            }
        }

        if votes.is_empty() {
            return EnsembleVote::abstained();
        }

        let first = votes[0].1;
        let unanimous = votes.iter().all(|(_, d)| *d == first);

        if self.unanimous_mode && !unanimous {
            return EnsembleVote {
                direction: Direction::None,
                scores,
                unanimous,
                supporters: Vec::new(),
            };
        }

        let (leader, score) = scores.leader();
        let direction = if score >= self.threshold {
            leader
        } else {
            Direction::None
        };
        let supporters = votes
            .iter()
            .filter(|(_, d)| *d == direction)
            .map(|(id, _)| id.to_string())
            .collect();

        EnsembleVote {
            direction,
            scores,
            unanimous,
            supporters,
        }
    }
}
