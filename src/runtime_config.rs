// =============================================================================
// Runtime Configuration - data source endpoints, defaults and fetch limits
// =============================================================================
//
// Loaded once at startup from a JSON file. All fields carry serde defaults so
// that an empty or partial file is valid; environment variables are applied
// on top of whatever the file provided.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::user_settings::UserSettings;

pub const DEFAULT_CONFIG_PATH: &str = "analyst_config.json";
pub const CONFIG_PATH_ENV: &str = "ANALYST_CONFIG";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_spot_base() -> String {
    "https://api.binance.com/api/v3".to_string()
}

fn default_futures_base() -> String {
    "https://fapi.binance.com/fapi/v1".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_benchmarks() -> Vec<String> {
    vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]
}

fn default_chunk_size() -> usize {
    4000
}

fn default_depth_limit() -> u32 {
    100
}

fn default_trades_limit() -> u32 {
    1000
}

fn default_funding_limit() -> u32 {
    100
}

fn default_open_interest_limit() -> u32 {
    30
}

// =============================================================================
// FetchLimits
// =============================================================================

/// How many rows to request from each endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchLimits {
    #[serde(default = "default_depth_limit")]
    pub depth: u32,

    #[serde(default = "default_trades_limit")]
    pub trades: u32,

    #[serde(default = "default_funding_limit")]
    pub funding: u32,

    /// Points of open-interest history; the change is measured across them.
    #[serde(default = "default_open_interest_limit")]
    pub open_interest: u32,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            depth: default_depth_limit(),
            trades: default_trades_limit(),
            funding: default_funding_limit(),
            open_interest: default_open_interest_limit(),
        }
    }
}

// =============================================================================
// AppConfig
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Spot REST base including the version prefix.
    #[serde(default = "default_spot_base")]
    pub binance_api: String,

    /// USD-M futures base including the version prefix. A bare host is
    /// accepted too.
    #[serde(default = "default_futures_base")]
    pub binance_fapi: String,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Benchmark symbols for the correlation section, in report order.
    #[serde(default = "default_benchmarks")]
    pub benchmarks: Vec<String>,

    /// Preferences handed to a chat id the first time it is seen.
    #[serde(default)]
    pub default_settings: UserSettings,

    #[serde(default)]
    pub limits: FetchLimits,

    /// Maximum characters per text chunk in report responses.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Bearer token required by the API. Only ever read from the environment.
    #[serde(skip)]
    pub api_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            binance_api: default_spot_base(),
            binance_fapi: default_futures_base(),
            bind_addr: default_bind_addr(),
            benchmarks: default_benchmarks(),
            default_settings: UserSettings::default(),
            limits: FetchLimits::default(),
            chunk_size: default_chunk_size(),
            api_token: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            benchmarks = ?config.benchmarks,
            "config loaded"
        );

        Ok(config)
    }

    /// Load from `path`, falling back to defaults with a warning when the file
    /// is missing or unreadable.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(error = %e, "using default config");
                Self::default()
            }
        }
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = non_empty("BINANCE_API") {
            self.binance_api = v;
        }
        if let Some(v) = non_empty("BINANCE_FAPI") {
            self.binance_fapi = v;
        }
        if let Some(v) = non_empty("ANALYST_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = non_empty("ANALYST_BENCHMARKS") {
            let list: Vec<String> = v
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !list.is_empty() {
                self.benchmarks = list;
            }
        }
        if let Some(v) = non_empty("ANALYST_API_TOKEN") {
            self.api_token = Some(v);
        }
    }

    /// File path from `ANALYST_CONFIG` (or the default), then process env.
    pub fn from_env() -> Self {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut cfg = Self::load_or_default(path);
        cfg.apply_env(|key| std::env::var(key).ok());
        if cfg.api_token.is_none() {
            warn!("ANALYST_API_TOKEN not set: API authentication disabled");
        }
        cfg
    }
}
