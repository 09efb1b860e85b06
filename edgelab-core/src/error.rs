//! Pipeline error types.
//!
//! Only configuration mistakes are hard failures here. Insufficient data,
//! degenerate numerics, and empty inputs are absorbed into return values by
//! the individual stages.

use thiserror::Error;

/// Hard failures surfaced to the pipeline caller.
#[derive(Debug, Error)]
pub enum SignalError {
    /// A pluggable-strategy id was requested that no registry entry matches.
    /// Unknown rule-condition names are non-fatal; an unknown strategy id
    /// is a configuration error and must stop the run.
    #[error("strategy not found in registry: {id:?}")]
    StrategyNotFound { id: String },
}
