// =============================================================================
// Volume Flow Analyzer - buy/sell split and delta over the recent tape
// =============================================================================
//
//   delta     = buy_volume - sell_volume
//   delta_pct = delta / (buy_volume + sell_volume) * 100, 0 when the total is 0
//
// Only the last `lookback` trades by position are considered.

use serde::Serialize;
use tracing::debug;

use super::{AnalysisResult, Analyzer};
use crate::market_data::{Trade, TradeSide};

/// Number of most recent trades considered by `analyze`.
pub const DEFAULT_LOOKBACK: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowBias {
    Buyers,
    Sellers,
    Balanced,
}

impl FlowBias {
    /// Sign of the delta; zero is an exact balance.
    pub fn classify(delta: f64) -> Self {
        if delta > 0.0 {
            Self::Buyers
        } else if delta < 0.0 {
            Self::Sellers
        } else {
            Self::Balanced
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::Buyers => "buyers dominate",
            Self::Sellers => "sellers dominate",
            Self::Balanced => "balanced",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeFlowSummary {
    pub symbol: String,
    pub trades_considered: usize,
    pub buy_volume: f64,
    pub sell_volume: f64,
    pub delta: f64,
    pub delta_pct: f64,
    pub bias: FlowBias,
}

pub struct VolumeFlowAnalyzer {
    symbol: String,
    trades: Vec<Trade>,
}

impl VolumeFlowAnalyzer {
    pub fn new(symbol: impl Into<String>, trades: Vec<Trade>) -> Self {
        Self {
            symbol: symbol.into(),
            trades,
        }
    }

    pub fn calc(&self, lookback: usize) -> VolumeFlowSummary {
        let start = self.trades.len().saturating_sub(lookback);
        let window = &self.trades[start..];

        let (buy_volume, sell_volume) =
            window.iter().fold((0.0_f64, 0.0_f64), |(buy, sell), t| match t.side {
                TradeSide::Buy => (buy + t.qty, sell),
                TradeSide::Sell => (buy, sell + t.qty),
            });

        let delta = buy_volume - sell_volume;
        let total = buy_volume + sell_volume;
        let delta_pct = if total > 0.0 { delta / total * 100.0 } else { 0.0 };

        VolumeFlowSummary {
            symbol: self.symbol.clone(),
            trades_considered: window.len(),
            buy_volume,
            sell_volume,
            delta,
            delta_pct,
            bias: FlowBias::classify(delta),
        }
    }
}

impl Analyzer for VolumeFlowAnalyzer {
    fn section(&self) -> &'static str {
        "volume"
    }

    fn analyze(&self) -> AnalysisResult {
        let summary = self.calc(DEFAULT_LOOKBACK);
        debug!(
            symbol = %self.symbol,
            trades = summary.trades_considered,
            delta = summary.delta,
            "volume flow analysis complete"
        );
        AnalysisResult::from_payload(render(&summary), &summary)
    }
}

/// Render the volume flow narrative from its payload.
pub fn render(s: &VolumeFlowSummary) -> String {
    format!(
        "Volume flow for {} (last {} trades):\n\
         - Buy volume: {:.2}\n\
         - Sell volume: {:.2}\n\
         - Delta: {:.2} ({:.2}%), {}.",
        s.symbol,
        s.trades_considered,
        s.buy_volume,
        s.sell_volume,
        s.delta,
        s.delta_pct,
        s.bias.describe()
    )
}
