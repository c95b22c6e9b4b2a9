// =============================================================================
// REST API - Axum router for reports and user preferences
// =============================================================================
//
// All endpoints live under `/api/v1/`. Health is public; everything else
// requires a valid Bearer token checked via the `AuthBearer` extractor.
//
// CORS is configured permissively; tighten `allow_origin` when exposing the
// service beyond a trusted front-end.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::analytics::StructuredReport;
use crate::api::auth::AuthBearer;
use crate::api::chunks::chunk_text;
use crate::api::error::ApiError;
use crate::app_state::AppState;
use crate::binance::WeightSnapshot;
use crate::types::ReportKind;
use crate::user_settings::{SettingsUpdate, UserSettings};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Public ──────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        // ── Authenticated ───────────────────────────────────────────
        .route(
            "/api/v1/settings/:chat_id",
            get(get_settings).post(update_settings),
        )
        .route("/api/v1/reports/:chat_id/:kind", get(report))
        .route("/api/v1/reports/:chat_id/:kind/structured", get(structured_report))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health (public)
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    server_time: i64,
    benchmarks: Vec<String>,
    request_weight: Option<WeightSnapshot>,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_secs(),
        server_time: chrono::Utc::now().timestamp_millis(),
        benchmarks: state.service.benchmarks().to_vec(),
        request_weight: state.service.request_weight(),
    })
}

// =============================================================================
// Settings (authenticated)
// =============================================================================

async fn get_settings(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i64>,
) -> Json<UserSettings> {
    Json(state.settings.get(chat_id))
}

async fn update_settings(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i64>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<UserSettings>, ApiError> {
    let settings = state.settings.update(chat_id, &update)?;
    Ok(Json(settings))
}

// =============================================================================
// Reports (authenticated)
// =============================================================================

#[derive(Serialize)]
struct ReportResponse {
    kind: ReportKind,
    symbol: String,
    interval: String,
    candles_limit: u32,
    chunks: Vec<String>,
}

fn parse_kind(raw: &str) -> Result<ReportKind, ApiError> {
    raw.parse().map_err(ApiError::BadRequest)
}

async fn report(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path((chat_id, kind)): Path<(i64, String)>,
) -> Result<Json<ReportResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let settings = state.settings.get(chat_id);

    let text = state.service.report_text(kind, &settings).await?;
    let chunks = chunk_text(&text, state.config.chunk_size);
    info!(chat_id, %kind, symbol = %settings.symbol, chunks = chunks.len(), "report served");

    Ok(Json(ReportResponse {
        kind,
        symbol: settings.symbol,
        interval: settings.interval,
        candles_limit: settings.candles_limit,
        chunks,
    }))
}

async fn structured_report(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path((chat_id, kind)): Path<(i64, String)>,
) -> Result<Json<StructuredReport>, ApiError> {
    if parse_kind(&kind)? != ReportKind::Full {
        return Err(ApiError::BadRequest(format!(
            "structured output is only available for the full report, not '{kind}'"
        )));
    }
    let settings = state.settings.get(chat_id);
    let report = state.service.full_report(&settings).await?.build_structured();
    info!(
        chat_id,
        symbol = %settings.symbol,
        report_id = %report.report_id,
        "structured report served"
    );
    Ok(Json(report))
}
