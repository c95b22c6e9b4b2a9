use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::user_settings::SettingsError;

/// Unified error type for API responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The market-data source failed or returned something undecodable.
    #[error("upstream_error: {0}")]
    Upstream(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Upstream(format!("{e:#}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) | Self::Settings(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(msg) => {
                error!(error = %msg, "report generation failed");
                StatusCode::BAD_GATEWAY
            }
        };
        let body = json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        let resp = ApiError::BadRequest("x".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = ApiError::from(SettingsError::InvalidCandlesLimit(3)).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let upstream = anyhow::anyhow!("boom").context("failed to load klines");
        let resp = ApiError::from(upstream).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn upstream_message_keeps_context_chain() {
        let err = ApiError::from(anyhow::anyhow!("timeout").context("failed to load trades"));
        assert_eq!(err.to_string(), "upstream_error: failed to load trades: timeout");
    }
}
