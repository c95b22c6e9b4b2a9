// =============================================================================
// Market-data source - where the analyzers' tables come from
// =============================================================================

pub mod client;
pub mod rate_limit;

pub use client::BinanceClient;
pub use rate_limit::WeightSnapshot;

use anyhow::Result;
use async_trait::async_trait;

use crate::market_data::{BookLevel, Candle, FundingObservation, OpenInterestObservation, Trade};

/// Both sides of an order book snapshot, as returned by the venue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepthSnapshot {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

/// Read-only access to public market data.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn klines(&self, symbol: &str, interval: &str, limit: u32) -> Result<Vec<Candle>>;

    async fn order_book(&self, symbol: &str, limit: u32) -> Result<DepthSnapshot>;

    async fn trades(&self, symbol: &str, limit: u32) -> Result<Vec<Trade>>;

    async fn funding(&self, symbol: &str, limit: u32) -> Result<Vec<FundingObservation>>;

    async fn open_interest(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<OpenInterestObservation>>;

    /// Request weight consumed upstream, for sources that report one.
    fn request_weight(&self) -> Option<WeightSnapshot> {
        None
    }
}
