// =============================================================================
// Market Data - in-memory tables handed to the analyzers
// =============================================================================
//
// Every table is a plain `Vec` of rows created per request and dropped once
// the analysis result has been produced.

pub mod candle;
pub mod derivatives;
pub mod orderbook;
pub mod trades;

pub use candle::Candle;
pub use derivatives::{FundingObservation, OpenInterestObservation};
pub use orderbook::BookLevel;
pub use trades::{Trade, TradeSide};

use thiserror::Error;

/// Structural problems found while decoding a raw table into typed rows.
#[derive(Debug, Error, PartialEq)]
pub enum DataError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' is not a number: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("unexpected payload shape: {0}")]
    UnexpectedShape(&'static str),

    #[error("candle at {open_time} has an inconsistent price range")]
    MalformedCandle { open_time: i64 },
}
