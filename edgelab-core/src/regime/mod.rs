//! Regime classifier — labels market behavior from a candle window.
//!
//! Purely derived, recomputed every tick, no persisted lifecycle. Only
//! classifications with confidence >= `CONFIDENCE_THRESHOLD` may alter
//! downstream behavior; anything weaker is treated as unknown and leaves
//! signals untouched.

use serde::{Deserialize, Serialize};

use crate::config::RegimeConfig;
use crate::domain::{Candle, Direction, Signal};
use crate::numeric::safe_div;

/// Minimum confidence for a regime to gate or resize signals.
pub const CONFIDENCE_THRESHOLD: f64 = 60.0;

/// Candles examined per classification.
const CLASSIFY_WINDOW: usize = 20;

/// Minimum candles to classify at all.
const MIN_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegimeLabel {
    TrendingUp,
    TrendingDown,
    Ranging,
    BreakoutWatch,
    Unknown,
}

/// How the current regime wants opening signals treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    /// No filtering.
    All,
    /// Keep only signals triggered by momentum/trend conditions.
    TrendOnly,
    /// Keep only signals triggered by mean-reversion conditions.
    ReversalOnly,
    /// Reject every opening signal.
    Block,
    /// Halve position size, no filtering.
    ReducedSize,
}

/// Classified market behavior plus confidence (0-100).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Regime {
    pub label: RegimeLabel,
    pub confidence: f64,
    pub filter_mode: FilterMode,
}

impl Regime {
    pub fn unknown() -> Self {
        Self {
            label: RegimeLabel::Unknown,
            confidence: 0.0,
            filter_mode: FilterMode::All,
        }
    }

    /// The filter mode after the confidence gate: low-confidence regimes
    /// must not filter or resize anything.
    pub fn effective_mode(&self) -> FilterMode {
        if self.confidence >= CONFIDENCE_THRESHOLD {
            self.filter_mode
        } else {
            FilterMode::All
        }
    }
}

/// Classify the most recent candles into a regime.
///
/// Heuristics, in precedence order:
/// 1. Range compression (recent range a small fraction of the window
///    range, with weak net direction) -> breakout watch, block entries.
/// 2. Directional strength (net move dominating gross movement) -> trending.
/// 3. High relative volatility while directionless -> ranging, reduced size.
/// 4. Otherwise -> ranging, reversal-only.
pub fn classify(candles: &[Candle]) -> Regime {
    if candles.len() < MIN_WINDOW {
        return Regime::unknown();
    }
    let window = &candles[candles.len().saturating_sub(CLASSIFY_WINDOW)..];
    let closes: Vec<f64> = window.iter().map(|c| c.close).collect();

    // Directional strength: |net change| / sum |per-candle change|, 0..1.
    let net = closes[closes.len() - 1] - closes[0];
    let gross: f64 = closes.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    let trend_strength = safe_div(net.abs(), gross);

    // Range compression: range of the last quarter vs the whole window.
    let window_high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let window_low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let recent = &window[window.len() - window.len() / 4 - 1..];
    let recent_high = recent.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let recent_low = recent.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let compression = safe_div(recent_high - recent_low, window_high - window_low);

    // Relative volatility: mean absolute per-candle return.
    let mean_abs_return = safe_div(
        closes
            .windows(2)
            .map(|w| safe_div((w[1] - w[0]).abs(), w[0]))
            .sum::<f64>(),
        (closes.len() - 1) as f64,
    );

    if compression < 0.25 && trend_strength < 0.3 {
        let confidence = ((1.0 - compression / 0.25) * 100.0).clamp(0.0, 100.0);
        return Regime {
            label: RegimeLabel::BreakoutWatch,
            confidence,
            filter_mode: FilterMode::Block,
        };
    }

    if trend_strength >= 0.45 {
        let label = if net > 0.0 {
            RegimeLabel::TrendingUp
        } else {
            RegimeLabel::TrendingDown
        };
        return Regime {
            label,
            confidence: (trend_strength * 100.0).clamp(0.0, 100.0),
            filter_mode: FilterMode::TrendOnly,
        };
    }

    // Directionless. Choppy-and-wide gets reduced size, quiet chop prefers
    // mean-reversion entries.
    if mean_abs_return > 0.02 {
        Regime {
            label: RegimeLabel::Ranging,
            confidence: ((1.0 - trend_strength) * 80.0).clamp(0.0, 100.0),
            filter_mode: FilterMode::ReducedSize,
        }
    } else {
        Regime {
            label: RegimeLabel::Ranging,
            confidence: ((1.0 - trend_strength) * 80.0).clamp(0.0, 100.0),
            filter_mode: FilterMode::ReversalOnly,
        }
    }
}

/// Outcome of applying a regime to an opening signal.
#[derive(Debug, Clone, PartialEq)]
pub enum RegimeVerdict {
    Pass,
    /// Pass, but scale the position-size ratio.
    Resize(f64),
    Reject(String),
}

/// Gate an opening signal through the regime's effective filter mode.
///
/// A signal survives `TrendOnly`/`ReversalOnly` when at least one of its
/// satisfied condition names belongs to the corresponding partition.
/// Closing signals are never passed to this function.
pub fn apply_regime(regime: &Regime, signal: &Signal, cfg: &RegimeConfig) -> RegimeVerdict {
    debug_assert!(signal.direction.is_entry());

    if !cfg.enabled {
        return RegimeVerdict::Pass;
    }

    match regime.effective_mode() {
        FilterMode::All => RegimeVerdict::Pass,
        FilterMode::ReducedSize => RegimeVerdict::Resize(0.5),
        FilterMode::Block => RegimeVerdict::Reject(format!(
            "regime {:?} blocks new entries (confidence {:.0})",
            regime.label, regime.confidence
        )),
        FilterMode::TrendOnly => partition_verdict(signal, &cfg.trend_conditions, "trend"),
        FilterMode::ReversalOnly => {
            partition_verdict(signal, &cfg.reversal_conditions, "reversal")
        }
    }
}

fn partition_verdict(signal: &Signal, allowed: &[String], partition: &str) -> RegimeVerdict {
    let matched = signal.reasons.iter().any(|r| allowed.iter().any(|a| a == r));
    if matched {
        RegimeVerdict::Pass
    } else {
        RegimeVerdict::Reject(format!(
            "regime keeps {partition} signals only; triggered by {:?}",
            signal.reasons
        ))
    }
}
