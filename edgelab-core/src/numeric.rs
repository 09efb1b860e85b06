//! Numeric-safety helpers.
//!
//! Every division in the pipeline that could see a zero or non-finite
//! denominator goes through these, so degenerate inputs resolve to a defined
//! value instead of NaN or a panic.

/// `numerator / denominator`, or 0.0 when the denominator is zero or either
/// operand is non-finite.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

/// Signed fractional change from `base` to `value`; 0.0 when `base` is zero.
pub fn safe_pct(value: f64, base: f64) -> f64 {
    safe_div(value - base, base)
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}
