//! Session VWAP with volume-weighted standard-deviation bands.
//!
//! VWAP resets at UTC midnight: only candles sharing the last candle's UTC
//! date participate. The typical price (H+L+C)/3 is volume-weighted; the
//! bands use the volume-weighted variance of typical price around VWAP.

use serde::{Deserialize, Serialize};

use crate::domain::Candle;
use crate::numeric::safe_div;

/// VWAP plus 1-sigma and 2-sigma bands for the current UTC session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VwapBands {
    pub vwap: f64,
    pub upper: f64,
    pub lower: f64,
    pub upper_2: f64,
    pub lower_2: f64,
}

/// Compute session VWAP bands over the trailing same-UTC-day candles.
///
/// Zero session volume resolves every field to 0 rather than NaN.
pub fn session_vwap(candles: &[Candle]) -> VwapBands {
    let Some(last) = candles.last() else {
        return VwapBands::default();
    };
    let session_day = last.open_time.date_naive();

    // Walk back while candles are in the same UTC session.
    let start = candles
        .iter()
        .rposition(|c| c.open_time.date_naive() != session_day)
        .map(|i| i + 1)
        .unwrap_or(0);
    let session = &candles[start..];

    let total_volume: f64 = session.iter().map(|c| c.volume).sum();
    if total_volume <= 0.0 {
        return VwapBands::default();
    }

    let weighted_sum: f64 = session.iter().map(|c| c.typical_price() * c.volume).sum();
    let vwap = weighted_sum / total_volume;

    let weighted_var: f64 = session
        .iter()
        .map(|c| {
            let d = c.typical_price() - vwap;
            d * d * c.volume
        })
        .sum::<f64>()
        / total_volume;
    let sigma = weighted_var.max(0.0).sqrt();

    VwapBands {
        vwap,
        upper: vwap + sigma,
        lower: vwap - sigma,
        upper_2: vwap + 2.0 * sigma,
        lower_2: vwap - 2.0 * sigma,
    }
}

/// Convenience: where `price` sits relative to VWAP, as a signed fraction.
pub fn vwap_deviation(price: f64, bands: &VwapBands) -> f64 {
    safe_div(price - bands.vwap, bands.vwap)
}
