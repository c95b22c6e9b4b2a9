// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   MACD      = EMA(fast) - EMA(slow)
//   Signal    = EMA(signal) of MACD
//   Histogram = MACD - Signal
//
// All three EMAs are recursively seeded from the first value, so MACD is
// defined for every candle.
// =============================================================================

use serde::Serialize;

use super::ema::calculate_ema;

/// One MACD reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Compute the MACD line, its signal line and histogram for every close.
pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Vec<MacdPoint> {
    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);
    if fast_ema.len() != closes.len() || slow_ema.len() != closes.len() {
        return Vec::new();
    }

    let macd_line: Vec<f64> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = calculate_ema(&macd_line, signal_period);
    if signal_line.len() != macd_line.len() {
        return Vec::new();
    }

    macd_line
        .into_iter()
        .zip(signal_line)
        .map(|(macd, signal)| MacdPoint {
            macd,
            signal,
            histogram: macd - signal,
        })
        .collect()
}

/// Standard 12/26/9 MACD.
pub fn calculate(closes: &[f64]) -> Vec<MacdPoint> {
    calculate_macd(closes, 12, 26, 9)
}
