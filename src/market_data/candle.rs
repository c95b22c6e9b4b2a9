use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV candle for one fixed time bucket.
///
/// `open_time` is the bucket start in UNIX milliseconds and doubles as the
/// candle's unique timestamp within a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(open_time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Range-consistency check: finite, non-negative prices with the high and
    /// low enclosing the open and close.
    pub fn is_well_formed(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return false;
        }
        self.volume >= 0.0
            && self.high >= self.open.max(self.close).max(self.low)
            && self.low <= self.open.min(self.close).min(self.high)
    }
}

/// Sort `candles` ascending by `open_time`.
///
/// Returns `true` when the input was already in order, so callers can log
/// upstream ordering problems instead of silently hiding them.
pub fn sort_by_time(candles: &mut [Candle]) -> bool {
    let was_sorted = candles.windows(2).all(|w| w[0].open_time <= w[1].open_time);
    if !was_sorted {
        candles.sort_by_key(|c| c.open_time);
    }
    was_sorted
}

/// Extract the close column (oldest first).
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_candle() {
        assert!(Candle::new(0, 100.0, 105.0, 95.0, 102.0, 10.0).is_well_formed());
    }

    #[test]
    fn high_below_close_is_rejected() {
        assert!(!Candle::new(0, 100.0, 101.0, 95.0, 102.0, 10.0).is_well_formed());
    }

    #[test]
    fn nan_price_is_rejected() {
        assert!(!Candle::new(0, f64::NAN, 105.0, 95.0, 102.0, 10.0).is_well_formed());
    }

    #[test]
    fn sort_reorders_and_reports() {
        let mut candles = vec![
            Candle::new(3, 1.0, 1.0, 1.0, 3.0, 0.0),
            Candle::new(1, 1.0, 1.0, 1.0, 1.0, 0.0),
            Candle::new(2, 1.0, 1.0, 1.0, 2.0, 0.0),
        ];
        assert!(!sort_by_time(&mut candles));
        assert_eq!(closes(&candles), vec![1.0, 2.0, 3.0]);
        assert!(sort_by_time(&mut candles));
    }
}
