//! Moving-average and oscillator series.
//!
//! All functions return full series aligned with the input, `NAN` before the
//! indicator's lookback is satisfied. The snapshot layer reads the last two
//! defined entries so crossover logic needs no separate history buffer.

/// Simple moving average. `NAN` before `period - 1`.
pub fn sma_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }
    let mut window_sum: f64 = values[..period].iter().sum();
    result[period - 1] = window_sum / period as f64;
    for i in period..n {
        window_sum += values[i] - values[i - period];
        result[i] = window_sum / period as f64;
    }
    result
}

/// Exponential moving average seeded with the SMA of the first `period`
/// values. `NAN` before `period - 1`.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let seed: f64 = values[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = seed;
    let mut prev = seed;
    for i in period..n {
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }
    result
}

/// Relative Strength Index with Wilder smoothing. `NAN` before `period`.
///
/// Edge cases: no losses -> 100, no gains -> 0, no movement at all -> 50.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period + 1 {
        return result;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    result[period] = rsi_value(avg_gain, avg_loss);

    let alpha = 1.0 / period as f64;
    for i in (period + 1)..n {
        let change = closes[i] - closes[i - 1];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
        avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
        result[i] = rsi_value(avg_gain, avg_loss);
    }
    result
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// MACD line, signal line, and histogram series.
///
/// MACD = EMA(fast) - EMA(slow); signal = EMA(MACD, signal_period);
/// histogram = MACD - signal. The histogram is defined from index
/// `slow + signal_period - 2` onward.
pub fn macd_series(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let n = closes.len();
    let ema_fast = ema_series(closes, fast);
    let ema_slow = ema_series(closes, slow);

    let mut macd = vec![f64::NAN; n];
    for i in 0..n {
        if !ema_fast[i].is_nan() && !ema_slow[i].is_nan() {
            macd[i] = ema_fast[i] - ema_slow[i];
        }
    }

    // Signal line: EMA over the defined portion of the MACD line.
    let mut signal = vec![f64::NAN; n];
    let defined_from = macd.iter().position(|v| !v.is_nan());
    if let Some(start) = defined_from {
        let tail = ema_series(&macd[start..], signal_period);
        for (offset, value) in tail.into_iter().enumerate() {
            signal[start + offset] = value;
        }
    }

    let mut histogram = vec![f64::NAN; n];
    for i in 0..n {
        if !macd[i].is_nan() && !signal[i].is_nan() {
            histogram[i] = macd[i] - signal[i];
        }
    }

    (macd, signal, histogram)
}
