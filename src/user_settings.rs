// =============================================================================
// User Settings - per-chat report preferences
// =============================================================================
//
// Keyed store owned by the API layer. The analytic core receives a copy of
// the record per request and never touches the store itself.
// =============================================================================

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub const SUPPORTED_INTERVALS: &[&str] = &["1h", "4h", "1d"];
pub const SUPPORTED_CANDLE_LIMITS: &[u32] = &[100, 200, 500];
const QUOTE_ASSET: &str = "USDT";

fn default_symbol() -> String {
    "BNBUSDT".to_string()
}

fn default_interval() -> String {
    "1h".to_string()
}

fn default_candles_limit() -> u32 {
    100
}

/// Report preferences for one chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default = "default_symbol")]
    pub symbol: String,

    #[serde(default = "default_interval")]
    pub interval: String,

    /// Candles fetched per report; also the correlation window.
    #[serde(default = "default_candles_limit")]
    pub candles_limit: u32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            interval: default_interval(),
            candles_limit: default_candles_limit(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("symbol '{0}' must be a USDT pair")]
    InvalidSymbol(String),

    #[error("interval '{0}' is not supported (use one of 1h, 4h, 1d)")]
    InvalidInterval(String),

    #[error("candle count {0} is not supported (use one of 100, 200, 500)")]
    InvalidCandlesLimit(u32),
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub symbol: Option<String>,
    pub interval: Option<String>,
    pub candles_limit: Option<u32>,
}

impl SettingsUpdate {
    /// Validate every present field and apply them to a copy of `current`.
    /// Nothing is applied if any field is rejected.
    pub fn apply_to(&self, current: &UserSettings) -> Result<UserSettings, SettingsError> {
        let mut next = current.clone();
        if let Some(symbol) = &self.symbol {
            next.symbol = normalize_symbol(symbol)?;
        }
        if let Some(interval) = &self.interval {
            next.interval = validate_interval(interval)?;
        }
        if let Some(limit) = self.candles_limit {
            next.candles_limit = validate_candles_limit(limit)?;
        }
        Ok(next)
    }
}

pub fn normalize_symbol(raw: &str) -> Result<String, SettingsError> {
    let symbol = raw.trim().to_uppercase();
    let base_len = symbol.len().saturating_sub(QUOTE_ASSET.len());
    let valid = symbol.ends_with(QUOTE_ASSET)
        && base_len > 0
        && symbol.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(symbol)
    } else {
        Err(SettingsError::InvalidSymbol(raw.trim().to_string()))
    }
}

pub fn validate_interval(raw: &str) -> Result<String, SettingsError> {
    let interval = raw.trim();
    if SUPPORTED_INTERVALS.contains(&interval) {
        Ok(interval.to_string())
    } else {
        Err(SettingsError::InvalidInterval(interval.to_string()))
    }
}

pub fn validate_candles_limit(limit: u32) -> Result<u32, SettingsError> {
    if SUPPORTED_CANDLE_LIMITS.contains(&limit) {
        Ok(limit)
    } else {
        Err(SettingsError::InvalidCandlesLimit(limit))
    }
}

/// Thread-safe `chat_id -> UserSettings` map, last write wins.
#[derive(Debug)]
pub struct UserSettingsStore {
    defaults: UserSettings,
    inner: RwLock<HashMap<i64, UserSettings>>,
}

impl UserSettingsStore {
    pub fn new(defaults: UserSettings) -> Self {
        Self {
            defaults,
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Current settings for `chat_id`, creating the default record on first
    /// access.
    pub fn get(&self, chat_id: i64) -> UserSettings {
        if let Some(s) = self.inner.read().get(&chat_id) {
            return s.clone();
        }
        self.inner
            .write()
            .entry(chat_id)
            .or_insert_with(|| self.defaults.clone())
            .clone()
    }

    pub fn update(
        &self,
        chat_id: i64,
        update: &SettingsUpdate,
    ) -> Result<UserSettings, SettingsError> {
        let mut map = self.inner.write();
        let current = map.entry(chat_id).or_insert_with(|| self.defaults.clone());
        let next = update.apply_to(current)?;
        *current = next.clone();
        info!(
            chat_id,
            symbol = %next.symbol,
            interval = %next.interval,
            candles_limit = next.candles_limit,
            "user settings updated"
        );
        Ok(next)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
