// =============================================================================
// Application State - shared between all request handlers
// =============================================================================

use std::sync::Arc;
use std::time::Instant;

use crate::binance::MarketDataSource;
use crate::runtime_config::AppConfig;
use crate::service::AnalyticService;
use crate::user_settings::UserSettingsStore;

/// Everything a handler may touch. Wrapped in `Arc` by the router.
#[derive(Debug)]
pub struct AppState {
    pub config: AppConfig,
    pub settings: UserSettingsStore,
    pub service: AnalyticService,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, source: Arc<dyn MarketDataSource>) -> Self {
        let service = AnalyticService::new(source, config.benchmarks.clone(), config.limits);
        let settings = UserSettingsStore::new(config.default_settings.clone());
        Self {
            config,
            settings,
            service,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
