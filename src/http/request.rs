//! Request handling middleware.
//!
//! # Responsibilities
//! - Assign a request ID (UUID v4) unless the caller sent one
//! - Echo the request ID on the response
//! - Count and log every request per server
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Metrics are labelled by server name, never by path

use axum::{
    extract::{Request, State},
    http::HeaderName,
    middleware::Next,
    response::Response,
    Router,
};
use std::time::Instant;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::observability::metrics;

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Wrap `router` so every request carries an `x-request-id`.
pub fn with_request_id(router: Router) -> Router {
    router
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
}

/// Record the outcome of each request served by `server`.
pub async fn track_requests(
    State(server): State<&'static str>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_owned();

    let response = next.run(request).await;
    let status = response.status();
    metrics::record_request(server, status.as_u16());

    tracing::debug!(
        server,
        request_id = %request_id,
        method = %method,
        path = %path,
        status = status.as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request served"
    );
    response
}
