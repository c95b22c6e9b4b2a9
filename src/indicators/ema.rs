// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_0      = x_0
//   EMA_t      = x_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The recursion is seeded with the first value of the series and applied from
// the very first element; there is no warm-up truncation, so the output is as
// long as the input.
// =============================================================================

/// Smoothing factor `2 / (period + 1)`.
pub fn smoothing_factor(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// Compute the EMA series for `values` with look-back `period`.
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - empty input   => empty vec
pub fn calculate_ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return Vec::new();
    }
    let Some(&seed) = values.first() else {
        return Vec::new();
    };

    let multiplier = smoothing_factor(period);
    let mut result = Vec::with_capacity(values.len());
    let mut prev_ema = seed;
    result.push(seed);

    for &value in &values[1..] {
        let ema = value * multiplier + prev_ema * (1.0 - multiplier);
        result.push(ema);
        prev_ema = ema;
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema(&[], 5).is_empty());
    }

    #[test]
    fn ema_period_zero() {
        assert!(calculate_ema(&[1.0, 2.0, 3.0], 0).is_empty());
    }

    #[test]
    fn ema_seeded_with_first_value() {
        let ema = calculate_ema(&[7.0, 8.0], 12);
        assert_eq!(ema.len(), 2);
        assert!((ema[0] - 7.0).abs() < 1e-12);
    }

    #[test]
    fn ema_known_values() {
        // period 3 => multiplier 0.5
        let ema = calculate_ema(&[2.0, 4.0, 6.0, 8.0], 3);
        let expected = [2.0, 3.0, 4.5, 6.25];
        for (a, b) in ema.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-10, "got {a}, expected {b}");
        }
    }

    #[test]
    fn ema_constant_series_stays_constant() {
        let ema = calculate_ema(&[42.0; 30], 26);
        assert!(ema.iter().all(|v| (v - 42.0).abs() < 1e-10));
    }

    #[test]
    fn smoothing_factor_matches_definition() {
        assert!((smoothing_factor(12) - 2.0 / 13.0).abs() < 1e-15);
        assert!((smoothing_factor(9) - 0.2).abs() < 1e-15);
    }
}
