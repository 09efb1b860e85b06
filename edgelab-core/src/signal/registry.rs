//! Strategy registry — explicit lookup object, constructed once.
//!
//! Replaces any notion of a global mutable registry: the caller builds one,
//! registers implementations, and passes it by reference into the pipeline.
//! The id `"default"` is reserved for the built-in rule-based detector and
//! never resolves to a plugin.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SignalError;

use super::strategy::Strategy;

/// Reserved id that always means the rule-based detector.
pub const DEFAULT_STRATEGY_ID: &str = "default";

#[derive(Default)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy under its own id. Re-registering replaces.
    pub fn register(&mut self, strategy: Arc<dyn Strategy>) {
        self.strategies.insert(strategy.id().to_string(), strategy);
    }

    /// Resolve an id to a strategy.
    ///
    /// Unknown ids are a configuration error and must surface to the
    /// caller, not be silently ignored.
    pub fn resolve(&self, id: &str) -> Result<Arc<dyn Strategy>, SignalError> {
        self.strategies
            .get(id)
            .cloned()
            .ok_or_else(|| SignalError::StrategyNotFound { id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.strategies.contains_key(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }
}
