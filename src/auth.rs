//! Shared-secret gate for mutating endpoints.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::AppState;
use crate::error::RegistryError;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// True when the request carries exactly the configured key.
///
/// With no key configured every request is refused.
pub fn api_key_matches(headers: &HeaderMap, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return false;
    };
    headers
        .get(API_KEY_HEADER)
        .map(|provided| bool::from(provided.as_bytes().ct_eq(expected.as_bytes())))
        .unwrap_or(false)
}

/// Reject requests without a matching `X-API-Key` header with 401.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if api_key_matches(request.headers(), state.api_key.as_deref()) {
        return next.run(request).await;
    }

    if state.api_key.is_none() {
        warn!("Rejected {} {}: no API key configured", request.method(), request.uri().path());
    } else {
        warn!("Rejected {} {}: invalid API key", request.method(), request.uri().path());
    }
    RegistryError::Unauthorized.into_response()
}
