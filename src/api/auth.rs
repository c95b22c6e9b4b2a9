// =============================================================================
// Bearer Token Authentication - Axum extractor
// =============================================================================
//
// Validates `Authorization: Bearer <token>` against the token configured via
// `ANALYST_API_TOKEN`. Comparison is performed in constant time.
//
// Usage:
//
//   async fn handler(_auth: AuthBearer, State(state): State<Arc<AppState>>) { ... }
//
// Without a configured token every request is let through.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::app_state::AppState;

/// Compare two byte slices in constant time.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Proof that the request carried a valid token (or that auth is disabled).
pub struct AuthBearer;

pub struct AuthRejection {
    status: StatusCode,
    message: &'static str,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, axum::Json(body)).into_response()
    }
}

/// Check a raw `Authorization` header value against `expected`.
pub fn authorize(header: Option<&str>, expected: Option<&str>) -> Result<(), AuthRejection> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let token = match header.and_then(|v| v.strip_prefix("Bearer ")) {
        Some(t) => t.trim(),
        None => {
            warn!("missing or malformed Authorization header");
            return Err(AuthRejection {
                status: StatusCode::UNAUTHORIZED,
                message: "Missing or invalid authorization token",
            });
        }
    };

    if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        warn!("invalid API token presented");
        return Err(AuthRejection {
            status: StatusCode::FORBIDDEN,
            message: "Invalid authorization token",
        });
    }
    Ok(())
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthBearer {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        authorize(header, state.config.api_token.as_deref())?;
        Ok(AuthBearer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }

    #[test]
    fn disabled_auth_accepts_anything() {
        assert!(authorize(None, None).is_ok());
    }

    #[test]
    fn bearer_token_checked() {
        assert!(authorize(Some("Bearer s3cret"), Some("s3cret")).is_ok());
        let missing = authorize(None, Some("s3cret")).unwrap_err();
        assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
        let wrong = authorize(Some("Bearer nope"), Some("s3cret")).unwrap_err();
        assert_eq!(wrong.status, StatusCode::FORBIDDEN);
        let basic = authorize(Some("Basic s3cret"), Some("s3cret")).unwrap_err();
        assert_eq!(basic.status, StatusCode::UNAUTHORIZED);
    }
}
