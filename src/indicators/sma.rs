// =============================================================================
// Simple Moving Average (SMA) - fixed-window trailing mean
// =============================================================================
//
//   SMA_t = (x_{t-N+1} + ... + x_t) / N
//
// Undefined (None) for every index before the window fills.
// =============================================================================

/// Compute the trailing `window`-period mean for every index of `values`.
///
/// The output has the same length as the input; index `i` is `Some` only once
/// `i + 1 >= window`. A window of zero yields an all-`None` series.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    let divisor = window as f64;
    for (offset, slice) in values.windows(window).enumerate() {
        let mean = slice.iter().sum::<f64>() / divisor;
        if mean.is_finite() {
            out[offset + window - 1] = Some(mean);
        }
    }
    out
}
