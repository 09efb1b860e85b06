//! Risk-reward gate — estimated reward distance vs risk distance at entry.
//!
//! Support/resistance come from the most recent window's low/high unless
//! the caller supplies explicit pivot levels. Degenerate situations are
//! handled explicitly instead of producing a misleading ratio: a window
//! under 5 candles passes through, a price already outside the estimated
//! range rejects.

use crate::domain::{Candle, Direction};
use crate::numeric::safe_div;

/// Minimum candles for a meaningful support/resistance estimate.
const MIN_WINDOW: usize = 5;

/// Externally-supplied pivot levels, overriding window estimation.
#[derive(Debug, Clone, Copy)]
pub struct PivotLevels {
    pub support: f64,
    pub resistance: f64,
}

/// Outcome of the risk-reward check.
#[derive(Debug, Clone, PartialEq)]
pub enum RrVerdict {
    Pass,
    Reject(String),
}

/// Check an entry against the minimum reward/risk ratio.
///
/// Disabled entirely when `min_rr <= 0`.
pub fn check(
    direction: Direction,
    price: f64,
    candles: &[Candle],
    pivots: Option<PivotLevels>,
    sr_window: usize,
    min_rr: f64,
) -> RrVerdict {
    if min_rr <= 0.0 {
        return RrVerdict::Pass;
    }

    let (support, resistance) = match pivots {
        Some(p) => (p.support, p.resistance),
        None => {
            if candles.len() < MIN_WINDOW {
                // Not enough structure to estimate; let the other gates decide.
                return RrVerdict::Pass;
            }
            let window = &candles[candles.len().saturating_sub(sr_window)..];
            let support = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
            let resistance = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
            (support, resistance)
        }
    };

    let (risk, reward) = match direction {
        Direction::Buy => (price - support, resistance - price),
        Direction::Short => (resistance - price, price - support),
        // Exits and no-ops never reach the risk gates.
        _ => return RrVerdict::Pass,
    };

    if risk <= 0.0 || reward <= 0.0 {
        return RrVerdict::Reject(format!(
            "price {price:.4} outside estimated range [{support:.4}, {resistance:.4}]"
        ));
    }

    let rr = safe_div(reward, risk);
    if rr < min_rr {
        RrVerdict::Reject(format!("risk-reward {rr:.2} below minimum {min_rr:.2}"))
    } else {
        RrVerdict::Pass
    }
}
