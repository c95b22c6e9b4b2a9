// =============================================================================
// Order Book Snapshot - price levels for one side of the book
// =============================================================================

use serde::{Deserialize, Serialize};

/// A single resting price level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub qty: f64,
}

impl BookLevel {
    pub fn new(price: f64, qty: f64) -> Self {
        Self { price, qty }
    }

    /// Quote-currency value resting at this level.
    pub fn notional(&self) -> f64 {
        self.price * self.qty
    }
}

/// Sort bids best-first (descending price).
pub fn sort_bids(levels: &mut [BookLevel]) {
    levels.sort_by(|a, b| b.price.total_cmp(&a.price));
}

/// Sort asks best-first (ascending price).
pub fn sort_asks(levels: &mut [BookLevel]) {
    levels.sort_by(|a, b| a.price.total_cmp(&b.price));
}

/// Sum of `price * qty` over the first `depth` levels.
pub fn liquidity(levels: &[BookLevel], depth: usize) -> f64 {
    levels.iter().take(depth).map(BookLevel::notional).sum()
}

/// Normalised liquidity skew in [-1, +1]; zero when the book is empty.
pub fn imbalance(bid_liquidity: f64, ask_liquidity: f64) -> f64 {
    let total = bid_liquidity + ask_liquidity;
    if total > 0.0 {
        ((bid_liquidity - ask_liquidity) / total).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Spread in basis points of the mid price, `None` for a crossed-at-zero mid.
pub fn spread_bps(best_bid: f64, best_ask: f64) -> Option<f64> {
    let mid = (best_bid + best_ask) / 2.0;
    if mid > 0.0 {
        Some(((best_ask - best_bid) / mid) * 10_000.0)
    } else {
        None
    }
}
