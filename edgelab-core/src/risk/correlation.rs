//! Correlation gate — shrinks size against correlated open exposure.
//!
//! Compares the candidate symbol's recent close-return series with every
//! currently-held symbol's series. Crossing the threshold never rejects; it
//! proposes halving the position-size ratio, composing with other gates by
//! taking the minimum ratio.

use std::collections::HashMap;

use crate::domain::Candle;
use crate::numeric::{mean, safe_div};

/// Minimum overlapping return observations for a meaningful correlation.
const MIN_POINTS: usize = 5;

/// Returns the proposed size ratio (1.0 = unchanged, 0.5 = halved) and the
/// held symbol that triggered the reduction, if any.
pub fn size_adjustment(
    candidate: &[Candle],
    held: &HashMap<String, Vec<Candle>>,
    threshold: f64,
) -> (f64, Option<String>) {
    if held.is_empty() {
        return (1.0, None);
    }
    let candidate_returns = close_returns(candidate);
    if candidate_returns.len() < MIN_POINTS {
        return (1.0, None);
    }

    for (symbol, candles) in held {
        let other_returns = close_returns(candles);
        let corr = pearson(&candidate_returns, &other_returns);
        if corr > threshold {
            return (0.5, Some(symbol.clone()));
        }
    }
    (1.0, None)
}

fn close_returns(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|w| safe_div(w[1].close - w[0].close, w[0].close))
        .collect()
}

/// Pearson correlation over the overlapping tail of both series.
///
/// Returns 0.0 when either series is too short or has zero variance.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < MIN_POINTS {
        return 0.0;
    }
    let a = &a[a.len() - n..];
    let b = &b[b.len() - n..];

    let mean_a = mean(a);
    let mean_b = mean(b);
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for i in 0..n {
        let da = a[i] - mean_a;
        let db = b[i] - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    let denom = (var_a * var_b).sqrt();
    safe_div(cov, denom)
}
