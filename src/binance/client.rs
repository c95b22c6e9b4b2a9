// =============================================================================
// Binance REST API Client - public market data (spot + USD-M futures)
// =============================================================================
//
// Only unsigned public endpoints are used. Every response updates the request
// weight tracker; non-2xx responses are surfaced as errors without retry.
//
// Raw payload decoding lives in free `parse_*` functions so it can be tested
// without a network.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::rate_limit::{WeightSnapshot, WeightTracker};
use super::{DepthSnapshot, MarketDataSource};
use crate::market_data::{
    BookLevel, Candle, DataError, FundingObservation, OpenInterestObservation, Trade, TradeSide,
};

/// Periods accepted by `/futures/data/openInterestHist`.
const OI_PERIODS: &[&str] = &["5m", "15m", "30m", "1h", "2h", "4h", "6h", "12h", "1d"];
const OI_FALLBACK_PERIOD: &str = "1h";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const FUTURES_VERSION_PREFIX: &str = "/fapi/v1";

/// Binance public REST client.
#[derive(Clone)]
pub struct BinanceClient {
    /// Spot REST base including the version prefix, e.g. `https://api.binance.com/api/v3`.
    spot_base: String,
    /// USD-M futures base including the version prefix, e.g.
    /// `https://fapi.binance.com/fapi/v1`.
    futures_base: String,
    /// Futures host without a version, for the unversioned `/futures/data` routes.
    futures_host: String,
    client: reqwest::Client,
    weight: Arc<WeightTracker>,
}

impl BinanceClient {
    /// `futures_base` may be given with or without the `/fapi/v1` prefix.
    pub fn new(spot_base: impl Into<String>, futures_base: impl Into<String>) -> Result<Self> {
        let spot_base = spot_base.into().trim_end_matches('/').to_string();
        let (futures_base, futures_host) = split_futures_base(&futures_base.into());

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build reqwest client")?;

        debug!(spot = %spot_base, futures = %futures_base, "BinanceClient initialised");

        Ok(Self {
            spot_base,
            futures_base,
            futures_host,
            client,
            weight: Arc::new(WeightTracker::new()),
        })
    }

    /// GET `url`, record the weight header and return the JSON body.
    async fn get_json(&self, url: &str, endpoint: &str) -> Result<Value> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {endpoint} request failed"))?;

        self.weight.update_from_headers(resp.headers());

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse {endpoint} response"))?;

        if !status.is_success() {
            warn!(endpoint, %status, "Binance returned an error status");
            anyhow::bail!("Binance GET {} returned {}: {}", endpoint, status, body);
        }
        Ok(body)
    }
}

#[async_trait]
impl MarketDataSource for BinanceClient {
    /// GET /klines
    #[instrument(skip(self), name = "binance::klines")]
    async fn klines(&self, symbol: &str, interval: &str, limit: u32) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/klines?symbol={}&interval={}&limit={}",
            self.spot_base, symbol, interval, limit
        );
        let body = self.get_json(&url, "/klines").await?;
        let candles = parse_klines(&body).context("malformed klines payload")?;
        debug!(symbol, interval, count = candles.len(), "klines fetched");
        Ok(candles)
    }

    /// GET /depth
    #[instrument(skip(self), name = "binance::order_book")]
    async fn order_book(&self, symbol: &str, limit: u32) -> Result<DepthSnapshot> {
        let url = format!("{}/depth?symbol={}&limit={}", self.spot_base, symbol, limit);
        let body = self.get_json(&url, "/depth").await?;
        let book = parse_depth(&body).context("malformed depth payload")?;
        debug!(symbol, bids = book.bids.len(), asks = book.asks.len(), "depth fetched");
        Ok(book)
    }

    /// GET /aggTrades
    #[instrument(skip(self), name = "binance::trades")]
    async fn trades(&self, symbol: &str, limit: u32) -> Result<Vec<Trade>> {
        let url = format!("{}/aggTrades?symbol={}&limit={}", self.spot_base, symbol, limit);
        let body = self.get_json(&url, "/aggTrades").await?;
        let trades = parse_agg_trades(&body).context("malformed aggTrades payload")?;
        debug!(symbol, count = trades.len(), "trades fetched");
        Ok(trades)
    }

    /// GET /fapi/v1/fundingRate
    #[instrument(skip(self), name = "binance::funding")]
    async fn funding(&self, symbol: &str, limit: u32) -> Result<Vec<FundingObservation>> {
        let url = format!(
            "{}/fundingRate?symbol={}&limit={}",
            self.futures_base, symbol, limit
        );
        let body = self.get_json(&url, "/fapi/v1/fundingRate").await?;
        let series = parse_funding(&body).context("malformed fundingRate payload")?;
        debug!(symbol, count = series.len(), "funding history fetched");
        Ok(series)
    }

    /// GET /futures/data/openInterestHist
    #[instrument(skip(self), name = "binance::open_interest")]
    async fn open_interest(
        &self,
        symbol: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Vec<OpenInterestObservation>> {
        let period = oi_period(interval);
        let url = format!(
            "{}/futures/data/openInterestHist?symbol={}&period={}&limit={}",
            self.futures_host, symbol, period, limit
        );
        let body = self.get_json(&url, "/futures/data/openInterestHist").await?;
        let series =
            parse_open_interest_hist(&body).context("malformed openInterestHist payload")?;
        debug!(symbol, period, count = series.len(), "open interest history fetched");
        Ok(series)
    }

    fn request_weight(&self) -> Option<WeightSnapshot> {
        Some(self.weight.snapshot())
    }
}

impl std::fmt::Debug for BinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceClient")
            .field("spot_base", &self.spot_base)
            .field("futures_base", &self.futures_base)
            .field("futures_host", &self.futures_host)
            .field("weight", &self.weight)
            .finish()
    }
}

/// Versioned futures base and bare host from either form of the setting.
fn split_futures_base(raw: &str) -> (String, String) {
    let trimmed = raw.trim().trim_end_matches('/');
    match trimmed.strip_suffix(FUTURES_VERSION_PREFIX) {
        Some(host) => (trimmed.to_string(), host.to_string()),
        None => (
            format!("{trimmed}{FUTURES_VERSION_PREFIX}"),
            trimmed.to_string(),
        ),
    }
}

/// Open interest history period for a chart interval.
pub fn oi_period(interval: &str) -> &str {
    if OI_PERIODS.contains(&interval) {
        interval
    } else {
        OI_FALLBACK_PERIOD
    }
}

// =============================================================================
// Payload decoding
// =============================================================================

/// Parse a JSON value that may be either a string or a number into `f64`.
fn number(val: Option<&Value>, field: &'static str) -> Result<f64, DataError> {
    match val {
        None | Some(Value::Null) => Err(DataError::MissingField(field)),
        Some(Value::String(s)) => s.parse::<f64>().map_err(|_| DataError::InvalidNumber {
            field,
            value: s.clone(),
        }),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| DataError::InvalidNumber {
            field,
            value: n.to_string(),
        }),
        Some(other) => Err(DataError::InvalidNumber {
            field,
            value: other.to_string(),
        }),
    }
}

fn timestamp(val: Option<&Value>, field: &'static str) -> Result<i64, DataError> {
    match val {
        None | Some(Value::Null) => Err(DataError::MissingField(field)),
        Some(v) => v.as_i64().ok_or_else(|| DataError::InvalidNumber {
            field,
            value: v.to_string(),
        }),
    }
}

fn rows<'a>(body: &'a Value, what: &'static str) -> Result<&'a Vec<Value>, DataError> {
    body.as_array().ok_or(DataError::UnexpectedShape(what))
}

/// Klines arrive as arrays:
///   [0] openTime, [1] open, [2] high, [3] low, [4] close, [5] volume, ...
pub fn parse_klines(body: &Value) -> Result<Vec<Candle>, DataError> {
    rows(body, "klines response is not an array")?
        .iter()
        .map(|entry| {
            let arr = entry
                .as_array()
                .ok_or(DataError::UnexpectedShape("kline entry is not an array"))?;
            let candle = Candle::new(
                timestamp(arr.first(), "open_time")?,
                number(arr.get(1), "open")?,
                number(arr.get(2), "high")?,
                number(arr.get(3), "low")?,
                number(arr.get(4), "close")?,
                number(arr.get(5), "volume")?,
            );
            if !candle.is_well_formed() {
                return Err(DataError::MalformedCandle {
                    open_time: candle.open_time,
                });
            }
            Ok(candle)
        })
        .collect()
}

fn parse_levels(side: Option<&Value>, field: &'static str) -> Result<Vec<BookLevel>, DataError> {
    let levels = match side {
        None | Some(Value::Null) => return Err(DataError::MissingField(field)),
        Some(v) => v
            .as_array()
            .ok_or(DataError::UnexpectedShape("book side is not an array"))?,
    };
    levels
        .iter()
        .map(|level| {
            let pair = level
                .as_array()
                .ok_or(DataError::UnexpectedShape("book level is not an array"))?;
            Ok(BookLevel::new(
                number(pair.first(), "price")?,
                number(pair.get(1), "qty")?,
            ))
        })
        .collect()
}

/// `{"lastUpdateId": .., "bids": [["price", "qty"], ..], "asks": [..]}`
pub fn parse_depth(body: &Value) -> Result<DepthSnapshot, DataError> {
    if !body.is_object() {
        return Err(DataError::UnexpectedShape("depth response is not an object"));
    }
    Ok(DepthSnapshot {
        bids: parse_levels(body.get("bids"), "bids")?,
        asks: parse_levels(body.get("asks"), "asks")?,
    })
}

/// `[{"a": .., "p": "price", "q": "qty", "T": time, "m": buyer_is_maker}, ..]`
pub fn parse_agg_trades(body: &Value) -> Result<Vec<Trade>, DataError> {
    rows(body, "aggTrades response is not an array")?
        .iter()
        .map(|t| {
            let is_buyer_maker = t
                .get("m")
                .and_then(Value::as_bool)
                .ok_or(DataError::MissingField("m"))?;
            Ok(Trade::new(
                timestamp(t.get("T"), "T")?,
                number(t.get("p"), "p")?,
                number(t.get("q"), "q")?,
                TradeSide::from_buyer_maker(is_buyer_maker),
            ))
        })
        .collect()
}

/// `[{"symbol": .., "fundingTime": time, "fundingRate": "0.0001"}, ..]`
pub fn parse_funding(body: &Value) -> Result<Vec<FundingObservation>, DataError> {
    rows(body, "fundingRate response is not an array")?
        .iter()
        .map(|f| {
            Ok(FundingObservation {
                time: timestamp(f.get("fundingTime"), "fundingTime")?,
                funding_rate: number(f.get("fundingRate"), "fundingRate")?,
            })
        })
        .collect()
}

/// `[{"symbol": .., "sumOpenInterest": "123.4", "timestamp": time}, ..]`
pub fn parse_open_interest_hist(body: &Value) -> Result<Vec<OpenInterestObservation>, DataError> {
    rows(body, "openInterestHist response is not an array")?
        .iter()
        .map(|o| {
            Ok(OpenInterestObservation {
                time: timestamp(o.get("timestamp"), "timestamp")?,
                open_interest: number(o.get("sumOpenInterest"), "sumOpenInterest")?,
            })
        })
        .collect()
}
