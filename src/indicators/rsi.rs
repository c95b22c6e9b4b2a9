// =============================================================================
// Relative Strength Index (RSI) - simple rolling averages
// =============================================================================
//
// Step 1 - Compute price changes (deltas) from consecutive closes.
// Step 2 - Average gain / average loss = trailing mean of the positive /
//          negated-negative deltas over `period` deltas.
// Step 3 - RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Thresholds:  RSI > 70 => overbought,  RSI < 30 => oversold.
// =============================================================================

use serde::Serialize;

/// Above this the market is considered overbought.
pub const OVERBOUGHT: f64 = 70.0;
/// Below this the market is considered oversold.
pub const OVERSOLD: f64 = 30.0;

/// Interpretation band for an RSI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn classify(rsi: f64) -> Self {
        if rsi > OVERBOUGHT {
            Self::Overbought
        } else if rsi < OVERSOLD {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }
}

/// Compute the RSI for every close.
///
/// Index `i` is defined once `period` deltas are available, i.e. for
/// `i >= period`.
///
/// # Edge cases
/// - `period == 0` => all `None`
/// - no gains and no losses in the window => `None` (0/0)
/// - losses are zero but gains are not => 100.0
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() < period + 1 {
        return out;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let period_f = period as f64;

    for (offset, window) in deltas.windows(period).enumerate() {
        let (sum_gain, sum_loss) = window.iter().fold((0.0_f64, 0.0_f64), |(g, l), &d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l - d)
            }
        });
        // Delta index `offset + period - 1` belongs to close `offset + period`.
        out[offset + period] = rsi_from_averages(sum_gain / period_f, sum_loss / period_f);
    }

    out
}

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_gain == 0.0 && avg_loss == 0.0 {
        return None;
    }
    let rsi = if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    rsi.is_finite().then(|| rsi.clamp(0.0, 100.0))
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_empty_input() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_period_zero() {
        assert!(calculate_rsi(&[1.0, 2.0, 3.0], 0).iter().all(Option::is_none));
    }

    #[test]
    fn rsi_undefined_until_period_deltas() {
        // 15 closes => 14 deltas => only the last index is defined.
        let closes: Vec<f64> = (1..=15).map(|x| x as f64).collect();
        let series = calculate_rsi(&closes, 14);
        assert!(series[..14].iter().all(Option::is_none));
        assert!(series[14].is_some());
    }

    #[test]
    fn rsi_all_gains() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let series = calculate_rsi(&closes, 14);
        for v in series.iter().flatten() {
            assert!((v - 100.0).abs() < 1e-10, "expected 100.0, got {v}");
        }
    }

    #[test]
    fn rsi_non_decreasing_with_flat_steps() {
        let closes = vec![
            1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 5.0, 5.0, 6.0, 7.0, 7.0, 8.0, 9.0, 9.0,
        ];
        let last = calculate_rsi(&closes, 14)[14].unwrap();
        assert!((last - 100.0).abs() < 1e-10);
    }

    #[test]
    fn rsi_all_losses() {
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        let series = calculate_rsi(&closes, 14);
        for v in series.iter().flatten() {
            assert!(v.abs() < 1e-10, "expected 0.0, got {v}");
        }
    }

    #[test]
    fn rsi_flat_market_is_undefined() {
        let closes = vec![100.0; 30];
        assert!(calculate_rsi(&closes, 14).iter().all(Option::is_none));
    }

    #[test]
    fn rsi_known_value() {
        // 3 gains of 1, 1 loss of 1 over a 4-delta window => RS = 3 => RSI = 75.
        let closes = [10.0, 11.0, 12.0, 11.0, 12.0];
        let rsi = calculate_rsi(&closes, 4)[4].unwrap();
        assert!((rsi - 75.0).abs() < 1e-10);
    }

    #[test]
    fn rsi_range_check() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        for v in calculate_rsi(&closes, 14).iter().flatten() {
            assert!((0.0..=100.0).contains(v), "RSI {v} out of range");
        }
    }

    #[test]
    fn zone_thresholds_are_strict() {
        assert_eq!(RsiZone::classify(70.0), RsiZone::Neutral);
        assert_eq!(RsiZone::classify(70.1), RsiZone::Overbought);
        assert_eq!(RsiZone::classify(30.0), RsiZone::Neutral);
        assert_eq!(RsiZone::classify(29.9), RsiZone::Oversold);
    }
}
