// =============================================================================
// Trade Tape - executed trades with aggressor side
// =============================================================================

use serde::{Deserialize, Serialize};

/// Which side took liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Binance reports `m = true` when the buyer was the maker, which makes
    /// the taker a seller.
    pub fn from_buyer_maker(is_buyer_maker: bool) -> Self {
        if is_buyer_maker {
            Self::Sell
        } else {
            Self::Buy
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// A single executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub time: i64,
    pub price: f64,
    pub qty: f64,
    pub side: TradeSide,
}

impl Trade {
    pub fn new(time: i64, price: f64, qty: f64, side: TradeSide) -> Self {
        Self {
            time,
            price,
            qty,
            side,
        }
    }
}
