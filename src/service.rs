// =============================================================================
// Analytic Service - fetch tables, run analyzers, assemble reports
// =============================================================================
//
// One operation per report kind. Every call fetches fresh tables from the
// market-data source, hands them to freshly built analyzers and drops them
// once the result exists. Fetches belonging to one report run concurrently.
// =============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::future::try_join_all;
use tracing::info;

use crate::analytics::{
    AnalysisResult, Analyzer, CandleAnalyzer, CorrelationAnalyzer, DerivativesAnalyzer,
    OrderBookAnalyzer, ReportBuilder, VolumeFlowAnalyzer,
};
use crate::binance::{MarketDataSource, WeightSnapshot};
use crate::market_data::Candle;
use crate::runtime_config::FetchLimits;
use crate::types::ReportKind;
use crate::user_settings::UserSettings;

#[derive(Clone)]
pub struct AnalyticService {
    source: Arc<dyn MarketDataSource>,
    benchmarks: Vec<String>,
    limits: FetchLimits,
}

impl AnalyticService {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        benchmarks: Vec<String>,
        limits: FetchLimits,
    ) -> Self {
        Self {
            source,
            benchmarks,
            limits,
        }
    }

    pub fn benchmarks(&self) -> &[String] {
        &self.benchmarks
    }

    pub fn request_weight(&self) -> Option<WeightSnapshot> {
        self.source.request_weight()
    }

    // -------------------------------------------------------------------------
    // Fetch helpers
    // -------------------------------------------------------------------------

    async fn fetch_klines(&self, settings: &UserSettings) -> Result<Vec<Candle>> {
        self.source
            .klines(&settings.symbol, &settings.interval, settings.candles_limit)
            .await
            .with_context(|| format!("failed to load klines for {}", settings.symbol))
    }

    async fn fetch_benchmarks(
        &self,
        settings: &UserSettings,
    ) -> Result<Vec<(String, Vec<Candle>)>> {
        let fetches = self.benchmarks.iter().map(|name| async move {
            let candles = self
                .source
                .klines(name, &settings.interval, settings.candles_limit)
                .await
                .with_context(|| format!("failed to load benchmark klines for {name}"))?;
            Ok::<_, anyhow::Error>((name.clone(), candles))
        });
        try_join_all(fetches).await
    }

    async fn orderbook_analyzer(&self, symbol: &str) -> Result<OrderBookAnalyzer> {
        let book = self
            .source
            .order_book(symbol, self.limits.depth)
            .await
            .with_context(|| format!("failed to load order book for {symbol}"))?;
        Ok(OrderBookAnalyzer::new(symbol, book.bids, book.asks))
    }

    async fn volume_analyzer(&self, symbol: &str) -> Result<VolumeFlowAnalyzer> {
        let trades = self
            .source
            .trades(symbol, self.limits.trades)
            .await
            .with_context(|| format!("failed to load trades for {symbol}"))?;
        Ok(VolumeFlowAnalyzer::new(symbol, trades))
    }

    async fn derivatives_analyzer(
        &self,
        symbol: &str,
        interval: &str,
    ) -> Result<DerivativesAnalyzer> {
        let (funding, oi) = tokio::try_join!(
            self.source.funding(symbol, self.limits.funding),
            self.source.open_interest(symbol, interval, self.limits.open_interest),
        )
        .with_context(|| format!("failed to load derivatives data for {symbol}"))?;
        Ok(DerivativesAnalyzer::new(symbol, Some(funding), Some(oi)))
    }

    fn correlation_analyzer(
        &self,
        settings: &UserSettings,
        primary: Vec<Candle>,
        benchmarks: Vec<(String, Vec<Candle>)>,
    ) -> CorrelationAnalyzer {
        CorrelationAnalyzer::new(
            settings.symbol.as_str(),
            primary,
            benchmarks,
            settings.candles_limit as usize,
            settings.interval.as_str(),
        )
    }

    // -------------------------------------------------------------------------
    // Reports
    // -------------------------------------------------------------------------

    pub async fn candle_report(&self, settings: &UserSettings) -> Result<AnalysisResult> {
        let candles = self.fetch_klines(settings).await?;
        let analyzer =
            CandleAnalyzer::new(settings.symbol.as_str(), candles, settings.interval.as_str());
        Ok(analyzer.analyze())
    }

    pub async fn orderbook_report(&self, symbol: &str) -> Result<AnalysisResult> {
        Ok(self.orderbook_analyzer(symbol).await?.analyze())
    }

    pub async fn volume_report(&self, symbol: &str) -> Result<AnalysisResult> {
        Ok(self.volume_analyzer(symbol).await?.analyze())
    }

    pub async fn derivatives_report(&self, symbol: &str, interval: &str) -> Result<AnalysisResult> {
        Ok(self.derivatives_analyzer(symbol, interval).await?.analyze())
    }

    pub async fn correlation_report(&self, settings: &UserSettings) -> Result<AnalysisResult> {
        let (primary, benchmarks) =
            tokio::try_join!(self.fetch_klines(settings), self.fetch_benchmarks(settings))?;
        Ok(self.correlation_analyzer(settings, primary, benchmarks).analyze())
    }

    /// All five sections in fixed order: candles, order book, volume,
    /// derivatives, correlation.
    pub async fn full_report(&self, settings: &UserSettings) -> Result<ReportBuilder> {
        let symbol = settings.symbol.as_str();
        let (candles, benchmarks, book, volume, derivatives) = tokio::try_join!(
            self.fetch_klines(settings),
            self.fetch_benchmarks(settings),
            self.orderbook_analyzer(symbol),
            self.volume_analyzer(symbol),
            self.derivatives_analyzer(symbol, &settings.interval),
        )?;

        let candle_analyzer =
            CandleAnalyzer::new(symbol, candles.clone(), settings.interval.as_str());
        let correlation = self.correlation_analyzer(settings, candles, benchmarks);

        let builder = ReportBuilder::new(symbol).add_all(&[
            &candle_analyzer,
            &book,
            &volume,
            &derivatives,
            &correlation,
        ]);
        info!(
            symbol,
            interval = %settings.interval,
            sections = builder.len(),
            "full report assembled"
        );
        Ok(builder)
    }

    /// Narrative for `kind` under the given preferences.
    pub async fn report_text(&self, kind: ReportKind, settings: &UserSettings) -> Result<String> {
        info!(%kind, symbol = %settings.symbol, interval = %settings.interval, "building report");
        let text = match kind {
            ReportKind::Candles => self.candle_report(settings).await?.summary().to_string(),
            ReportKind::Orderbook => self
                .orderbook_report(&settings.symbol)
                .await?
                .summary()
                .to_string(),
            ReportKind::Volume => self.volume_report(&settings.symbol).await?.summary().to_string(),
            ReportKind::Derivatives => self
                .derivatives_report(&settings.symbol, &settings.interval)
                .await?
                .summary()
                .to_string(),
            ReportKind::Correlation => {
                self.correlation_report(settings).await?.summary().to_string()
            }
            ReportKind::Full => self.full_report(settings).await?.build_text(),
        };
        Ok(text)
    }
}

impl std::fmt::Debug for AnalyticService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticService")
            .field("benchmarks", &self.benchmarks)
            .field("limits", &self.limits)
            .finish()
    }
}

// =============================================================================
// In-memory source for tests
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::binance::{DepthSnapshot, MarketDataSource};
    use crate::market_data::{
        BookLevel, Candle, FundingObservation, OpenInterestObservation, Trade, TradeSide,
    };

    const HOUR_MS: i64 = 3_600_000;

    /// Serves fixed tables and records the requested kline limits.
    #[derive(Default)]
    pub struct StaticSource {
        pub klines: HashMap<String, Vec<Candle>>,
        pub book: DepthSnapshot,
        pub trades: Vec<Trade>,
        pub funding: Vec<FundingObservation>,
        pub open_interest: Vec<OpenInterestObservation>,
        pub fail_futures: bool,
        pub kline_calls: Mutex<Vec<(String, String, u32)>>,
    }

    pub fn ramp(n: usize, start: f64, step: f64) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let c = start + step * i as f64;
                Candle::new(i as i64 * HOUR_MS, c, c + 1.0, c - 1.0, c, 10.0)
            })
            .collect()
    }

    impl StaticSource {
        pub fn sample(symbol: &str) -> Self {
            let mut klines = HashMap::new();
            klines.insert(symbol.to_string(), ramp(60, 100.0, 1.0));
            klines.insert("BTCUSDT".to_string(), ramp(60, 30_000.0, 50.0));
            klines.insert("ETHUSDT".to_string(), ramp(60, 2_000.0, -3.0));
            Self {
                klines,
                book: DepthSnapshot {
                    bids: vec![BookLevel::new(100.0, 10.0)],
                    asks: vec![BookLevel::new(101.0, 10.0)],
                },
                trades: vec![
                    Trade::new(1, 100.0, 3.0, TradeSide::Buy),
                    Trade::new(2, 100.0, 1.0, TradeSide::Sell),
                ],
                funding: vec![FundingObservation { time: 1, funding_rate: 0.0001 }],
                open_interest: vec![
                    OpenInterestObservation { time: 1, open_interest: 1000.0 },
                    OpenInterestObservation { time: 2, open_interest: 1100.0 },
                ],
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl MarketDataSource for StaticSource {
        async fn klines(&self, symbol: &str, interval: &str, limit: u32) -> Result<Vec<Candle>> {
            self.kline_calls
                .lock()
                .push((symbol.to_string(), interval.to_string(), limit));
            let all = self
                .klines
                .get(symbol)
                .ok_or_else(|| anyhow!("Invalid symbol {symbol}"))?;
            let start = all.len().saturating_sub(limit as usize);
            Ok(all[start..].to_vec())
        }

        async fn order_book(&self, _symbol: &str, _limit: u32) -> Result<DepthSnapshot> {
            Ok(self.book.clone())
        }

        async fn trades(&self, _symbol: &str, _limit: u32) -> Result<Vec<Trade>> {
            Ok(self.trades.clone())
        }

        async fn funding(&self, symbol: &str, _limit: u32) -> Result<Vec<FundingObservation>> {
            if self.fail_futures {
                return Err(anyhow!("{symbol} is not listed on futures"));
            }
            Ok(self.funding.clone())
        }

        async fn open_interest(
            &self,
            _symbol: &str,
            _interval: &str,
            _limit: u32,
        ) -> Result<Vec<OpenInterestObservation>> {
            Ok(self.open_interest.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::StaticSource;
    use super::*;

    fn service(source: StaticSource) -> (AnalyticService, Arc<StaticSource>) {
        let source = Arc::new(source);
        let svc = AnalyticService::new(
            source.clone(),
            vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
            FetchLimits::default(),
        );
        (svc, source)
    }

    fn settings() -> UserSettings {
        UserSettings {
            symbol: "SOLUSDT".to_string(),
            interval: "4h".to_string(),
            candles_limit: 100,
        }
    }

    #[tokio::test]
    async fn candle_report_uses_user_preferences() {
        let (svc, source) = service(StaticSource::sample("SOLUSDT"));
        let result = svc.candle_report(&settings()).await.unwrap();
        assert!(result.summary().contains("SOLUSDT"));
        let calls = source.kline_calls.lock().clone();
        assert_eq!(calls, vec![("SOLUSDT".to_string(), "4h".to_string(), 100)]);
    }

    #[tokio::test]
    async fn correlation_fetches_every_benchmark() {
        let (svc, source) = service(StaticSource::sample("SOLUSDT"));
        let result = svc.correlation_report(&settings()).await.unwrap();
        assert!(result.data().contains_key("BTCUSDT"));
        assert!(result.data().contains_key("ETHUSDT"));
        assert_eq!(source.kline_calls.lock().len(), 3);
    }

    #[tokio::test]
    async fn full_report_has_five_sections_in_order() {
        let (svc, _) = service(StaticSource::sample("SOLUSDT"));
        let report = svc.full_report(&settings()).await.unwrap().build_structured();
        let names: Vec<_> = report.sections.iter().map(|s| s.section.as_str()).collect();
        assert_eq!(names, ["candles", "orderbook", "volume", "derivatives", "correlation"]);
        assert_eq!(report.symbol, "SOLUSDT");
    }

    #[tokio::test]
    async fn report_text_dispatches_by_kind() {
        let (svc, _) = service(StaticSource::sample("SOLUSDT"));
        let s = settings();
        let text = svc.report_text(ReportKind::Orderbook, &s).await.unwrap();
        assert!(text.starts_with("Order book for SOLUSDT"));
        let text = svc.report_text(ReportKind::Volume, &s).await.unwrap();
        assert!(text.contains("buyers dominate"));
        let text = svc.report_text(ReportKind::Full, &s).await.unwrap();
        assert!(text.starts_with("Combined report for SOLUSDT:"));
    }

    #[tokio::test]
    async fn unknown_symbol_propagates_error() {
        let (svc, _) = service(StaticSource::sample("SOLUSDT"));
        let mut s = settings();
        s.symbol = "NOPEUSDT".to_string();
        let err = svc.candle_report(&s).await.unwrap_err();
        assert!(format!("{err:#}").contains("NOPEUSDT"));
    }

    #[tokio::test]
    async fn futures_failure_fails_derivatives() {
        let mut source = StaticSource::sample("SOLUSDT");
        source.fail_futures = true;
        let (svc, _) = service(source);
        assert!(svc.derivatives_report("SOLUSDT", "1h").await.is_err());
        assert!(svc.full_report(&settings()).await.is_err());
    }
}
