//! Cross-tick strategy state.
//!
//! Strategies that track counters across ticks (consecutive losses, last
//! entry bar) go through this seam instead of touching files. Persistence
//! backends live outside the core; the in-memory store backs backtests and
//! tests.

use std::collections::HashMap;
use std::sync::Mutex;

/// Key-value store for per-symbol strategy counters.
///
/// Uses interior mutability so it can be shared as `&dyn StateStore`
/// through the pipeline context.
pub trait StateStore: Send + Sync {
    fn get(&self, symbol: &str, key: &str) -> Option<f64>;
    fn set(&self, symbol: &str, key: &str, value: f64);

    fn increment(&self, symbol: &str, key: &str, delta: f64) -> f64 {
        let next = self.get(symbol, key).unwrap_or(0.0) + delta;
        self.set(symbol, key, next);
        next
    }
}

/// Process-local store; the default for backtests.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    values: Mutex<HashMap<(String, String), f64>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, symbol: &str, key: &str) -> Option<f64> {
        self.values
            .lock()
            .expect("state store mutex poisoned")
            .get(&(symbol.to_string(), key.to_string()))
            .copied()
    }

    fn set(&self, symbol: &str, key: &str, value: f64) {
        self.values
            .lock()
            .expect("state store mutex poisoned")
            .insert((symbol.to_string(), key.to_string()), value);
    }
}
