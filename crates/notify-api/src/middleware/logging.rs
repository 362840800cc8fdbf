//! Access log.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;

/// One event per request, keyed by the route template so that
/// `/api/notifications/{id}` aggregates across ids.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = started.elapsed().as_millis() as u64;
    if status.is_server_error() {
        tracing::warn!(%method, %route, status = status.as_u16(), latency_ms, "Request failed");
    } else if status.is_client_error() {
        tracing::info!(%method, %route, status = status.as_u16(), latency_ms, "Request rejected");
    } else {
        tracing::info!(%method, %route, status = status.as_u16(), latency_ms, "Request served");
    }

    response
}
