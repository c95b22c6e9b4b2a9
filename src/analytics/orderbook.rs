// =============================================================================
// Order Book Analyzer - top-of-book liquidity and bid/ask imbalance
// =============================================================================
//
//   liquidity = sum(price * qty) over the best `depth` levels of a side
//   imbalance = (bid_liq - ask_liq) / (bid_liq + ask_liq), 0 when both are 0
//
// Side label:  imbalance > +0.10 buyers,  < -0.10 sellers,  else balanced.

use serde::Serialize;
use tracing::debug;

use super::{fmt_grouped, AnalysisResult, Analyzer};
use crate::market_data::orderbook::{self, BookLevel};

/// Levels per side included in the liquidity sums.
pub const DEFAULT_DEPTH: usize = 20;
/// Imbalance beyond which one side is considered dominant.
pub const IMBALANCE_THRESHOLD: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookBias {
    Buyers,
    Sellers,
    Balanced,
}

impl BookBias {
    pub fn classify(imbalance: f64) -> Self {
        if imbalance > IMBALANCE_THRESHOLD {
            Self::Buyers
        } else if imbalance < -IMBALANCE_THRESHOLD {
            Self::Sellers
        } else {
            Self::Balanced
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::Buyers => "advantage to buyers (bid)",
            Self::Sellers => "advantage to sellers (ask)",
            Self::Balanced => "book is balanced",
        }
    }
}

/// Liquidity figures for the top `depth` levels of each side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBookSummary {
    pub symbol: String,
    pub depth: usize,
    pub bid_liquidity: f64,
    pub ask_liquidity: f64,
    pub imbalance: f64,
    pub bias: BookBias,
    pub top_bid: Option<f64>,
    pub top_ask: Option<f64>,
    pub spread: Option<f64>,
    pub spread_bps: Option<f64>,
}

pub struct OrderBookAnalyzer {
    symbol: String,
    bids: Vec<BookLevel>,
    asks: Vec<BookLevel>,
}

impl OrderBookAnalyzer {
    /// Take ownership of both sides and sort them best-first.
    pub fn new(
        symbol: impl Into<String>,
        mut bids: Vec<BookLevel>,
        mut asks: Vec<BookLevel>,
    ) -> Self {
        orderbook::sort_bids(&mut bids);
        orderbook::sort_asks(&mut asks);
        Self {
            symbol: symbol.into(),
            bids,
            asks,
        }
    }

    pub fn summarize(&self, depth: usize) -> OrderBookSummary {
        let bid_liquidity = orderbook::liquidity(&self.bids, depth);
        let ask_liquidity = orderbook::liquidity(&self.asks, depth);
        let imbalance = orderbook::imbalance(bid_liquidity, ask_liquidity);

        let top_bid = self.bids.first().map(|l| l.price);
        let top_ask = self.asks.first().map(|l| l.price);
        let (spread, spread_bps) = match (top_bid, top_ask) {
            (Some(bid), Some(ask)) => (Some(ask - bid), orderbook::spread_bps(bid, ask)),
            _ => (None, None),
        };

        OrderBookSummary {
            symbol: self.symbol.clone(),
            depth,
            bid_liquidity,
            ask_liquidity,
            imbalance,
            bias: BookBias::classify(imbalance),
            top_bid,
            top_ask,
            spread,
            spread_bps,
        }
    }
}

impl Analyzer for OrderBookAnalyzer {
    fn section(&self) -> &'static str {
        "orderbook"
    }

    fn analyze(&self) -> AnalysisResult {
        let summary = self.summarize(DEFAULT_DEPTH);
        debug!(
            symbol = %self.symbol,
            imbalance = format!("{:.4}", summary.imbalance),
            bias = ?summary.bias,
            "order book analysis complete"
        );
        AnalysisResult::from_payload(render(&summary), &summary)
    }
}

/// Render the order book narrative from its payload.
pub fn render(s: &OrderBookSummary) -> String {
    let (Some(top_bid), Some(top_ask)) = (s.top_bid, s.top_ask) else {
        return format!("Order book for {}: not enough data.", s.symbol);
    };

    let mut out = format!(
        "Order book for {}:\n\
         - Best bid: {:.4}\n\
         - Best ask: {:.4}\n",
        s.symbol, top_bid, top_ask
    );
    if let Some(bps) = s.spread_bps {
        out.push_str(&format!("- Spread: {:.2} bps\n", bps));
    }
    out.push_str(&format!(
        "- BID liquidity (top{}): {}\n\
         - ASK liquidity (top{}): {}\n\
         - Imbalance: {:.2}%, {}.",
        s.depth,
        fmt_grouped(s.bid_liquidity),
        s.depth,
        fmt_grouped(s.ask_liquidity),
        s.imbalance * 100.0,
        s.bias.describe()
    ));
    out
}
