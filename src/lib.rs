// =============================================================================
// Aurora Analyst - market analysis reports over public exchange data
// =============================================================================

pub mod analytics;
pub mod api;
pub mod app_state;
pub mod binance;
pub mod indicators;
pub mod market_data;
pub mod runtime_config;
pub mod service;
pub mod types;
pub mod user_settings;
