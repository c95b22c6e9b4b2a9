// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators used by the candle
// analyzer. Rolling windows and exponential smoothing are implemented here
// explicitly so report numbers follow the stated formulas exactly.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

use crate::market_data::candle::{closes, Candle};

pub const MA_SHORT: usize = 20;
pub const MA_MEDIUM: usize = 50;
pub const MA_LONG: usize = 200;
pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;

/// Derived indicator columns, aligned index-for-index with the candles they
/// were computed from.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    pub ma20: Vec<Option<f64>>,
    pub ma50: Vec<Option<f64>>,
    pub ma200: Vec<Option<f64>>,
    pub rsi14: Vec<Option<f64>>,
    pub macd: Vec<macd::MacdPoint>,
    pub atr14: Vec<Option<f64>>,
}

impl IndicatorFrame {
    /// Compute every column over the full (time-sorted) series.
    pub fn compute(candles: &[Candle]) -> Self {
        let closes = closes(candles);
        Self {
            ma20: sma::rolling_mean(&closes, MA_SHORT),
            ma50: sma::rolling_mean(&closes, MA_MEDIUM),
            ma200: sma::rolling_mean(&closes, MA_LONG),
            rsi14: rsi::calculate_rsi(&closes, RSI_PERIOD),
            macd: macd::calculate(&closes),
            atr14: atr::calculate_atr(candles, ATR_PERIOD),
        }
    }

    pub fn len(&self) -> usize {
        self.ma20.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ma20.is_empty()
    }

    /// Snapshot of the most recent row.
    pub fn last(&self) -> Option<IndicatorRow> {
        let i = self.len().checked_sub(1)?;
        Some(IndicatorRow {
            ma20: self.ma20[i],
            ma50: self.ma50[i],
            ma200: self.ma200[i],
            rsi14: self.rsi14[i],
            macd: self.macd.get(i).copied(),
            atr14: self.atr14[i],
        })
    }
}

/// One row of the indicator frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorRow {
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
    pub ma200: Option<f64>,
    pub rsi14: Option<f64>,
    pub macd: Option<macd::MacdPoint>,
    pub atr14: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let c = 100.0 + i as f64;
                Candle::new(i as i64 * 60_000, c, c + 1.0, c - 1.0, c, 10.0)
            })
            .collect()
    }

    #[test]
    fn frame_columns_align_with_input() {
        let frame = IndicatorFrame::compute(&series(60));
        assert_eq!(frame.len(), 60);
        assert_eq!(frame.macd.len(), 60);
        assert_eq!(frame.atr14.len(), 60);
    }

    #[test]
    fn last_row_reflects_available_history() {
        let row = IndicatorFrame::compute(&series(60)).last().unwrap();
        assert!(row.ma20.is_some());
        assert!(row.ma50.is_some());
        assert!(row.ma200.is_none());
        assert!(row.rsi14.is_some());
        assert!(row.macd.is_some());
        assert!(row.atr14.is_some());
    }

    #[test]
    fn empty_frame_has_no_last_row() {
        let frame = IndicatorFrame::compute(&[]);
        assert!(frame.is_empty());
        assert!(frame.last().is_none());
    }
}
