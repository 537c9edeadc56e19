use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue, header::HeaderName},
    middleware::Next,
    response::Response,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Instrument, debug, info_span};

/// Global counter for generating request IDs
static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest client-supplied request ID that is accepted as-is
const MAX_REQUEST_ID_LEN: usize = 128;

/// Request ID stored in request extensions
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Attach a request ID (reusing the caller's when present), run the request
/// inside a span carrying it, and echo it on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = extract_or_generate_request_id(request.headers());
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let span = info_span!(
        "request",
        id = %request_id,
        method = %request.method(),
        path = %request.uri().path()
    );
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    debug!("Request {} completed with {}", request_id, response.status());
    response
}

/// Generate a unique request ID
pub fn generate_request_id() -> String {
    let counter = REQUEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let timestamp = chrono::Utc::now().timestamp_millis();
    format!("req_{}_{}", timestamp, counter)
}

/// Reuse a well-formed incoming request ID or generate a new one
pub fn extract_or_generate_request_id(headers: &HeaderMap) -> String {
    if let Some(value) = headers.get(REQUEST_ID_HEADER)
        && let Ok(id) = value.to_str()
        && !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id.chars().all(|c| c.is_ascii_graphic())
    {
        return id.to_string();
    }

    generate_request_id()
}
