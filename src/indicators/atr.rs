// =============================================================================
// Average True Range (ATR) - trailing mean of True Range
// =============================================================================
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
// The first bar has no previous close and contributes H - L only.
//
// ATR_t = mean(TR_{t-N+1} .. TR_t)
//
// Default period: 14
// =============================================================================

use crate::market_data::Candle;

use super::sma::rolling_mean;

/// True Range for every candle (oldest first).
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(candles.len());
    for (i, candle) in candles.iter().enumerate() {
        let hl = candle.high - candle.low;
        let value = match i.checked_sub(1).map(|p| candles[p].close) {
            Some(prev_close) => {
                let hc = (candle.high - prev_close).abs();
                let lc = (candle.low - prev_close).abs();
                hl.max(hc).max(lc)
            }
            None => hl,
        };
        tr.push(value);
    }
    tr
}

/// ATR for every candle; `None` until `period` True Range values exist.
pub fn calculate_atr(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    rolling_mean(&true_range(candles), period)
}

/// ATR as a percentage of `close`. `None` for a non-positive close.
pub fn atr_pct(atr: f64, close: f64) -> Option<f64> {
    if close > 0.0 {
        Some(atr / close * 100.0)
    } else {
        None
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(0, open, high, low, close, 100.0)
    }

    #[test]
    fn first_true_range_is_high_minus_low() {
        let tr = true_range(&[candle(100.0, 105.0, 95.0, 102.0)]);
        assert_eq!(tr, vec![10.0]);
    }

    #[test]
    fn true_range_uses_prev_close() {
        // Gap up: |115 - 95| = 20 > 115 - 108 = 7
        let tr = true_range(&[
            candle(100.0, 105.0, 95.0, 95.0),
            candle(110.0, 115.0, 108.0, 112.0),
        ]);
        assert!((tr[1] - 20.0).abs() < 1e-12);
    }

    #[test]
    fn atr_insufficient_data() {
        let candles = vec![candle(100.0, 105.0, 95.0, 102.0); 13];
        assert!(calculate_atr(&candles, 14).iter().all(Option::is_none));
    }

    #[test]
    fn atr_defined_from_fourteenth_candle() {
        let candles = vec![candle(100.0, 105.0, 95.0, 100.0); 14];
        let series = calculate_atr(&candles, 14);
        assert!(series[12].is_none());
        assert!((series[13].unwrap() - 10.0).abs() < 1e-10);
    }

    #[test]
    fn atr_constant_range() {
        let candles: Vec<Candle> = (0..30)
            .map(|_| candle(100.0, 105.0, 95.0, 100.0))
            .collect();
        let last = calculate_atr(&candles, 14).last().copied().flatten();
        assert!((last.unwrap() - 10.0).abs() < 1e-10);
    }

    #[test]
    fn atr_is_non_negative() {
        let candles: Vec<Candle> = (0..50)
            .map(|i| {
                let base = 100.0 + (i as f64 * 0.5).sin() * 10.0;
                candle(base - 0.5, base + 2.0, base - 2.0, base + 0.5)
            })
            .collect();
        for v in calculate_atr(&candles, 14).iter().flatten() {
            assert!(*v >= 0.0, "ATR must be non-negative, got {v}");
        }
    }

    #[test]
    fn atr_pct_guards_zero_close() {
        assert!(atr_pct(1.0, 0.0).is_none());
        assert!((atr_pct(2.0, 100.0).unwrap() - 2.0).abs() < 1e-12);
    }
}
