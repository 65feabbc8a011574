//! # Request Metrics Middleware
//!
//! Records a request counter and a latency histogram per matched route,
//! method, and status through the `metrics` facade. Without an installed
//! recorder the macros are no-ops.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;

/// Total HTTP requests.
pub const HTTP_REQUESTS_TOTAL: &str = "pcms_http_requests_total";
/// HTTP request latency in seconds.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "pcms_http_request_duration_seconds";
/// Preview tokens issued.
pub const PREVIEW_TOKENS_ISSUED_TOTAL: &str = "pcms_preview_tokens_issued_total";
/// Preview tokens rejected, labelled by `reason`.
pub const PREVIEW_TOKENS_REJECTED_TOTAL: &str = "pcms_preview_tokens_rejected_total";

/// Middleware that records request count and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    // Route templates keep label cardinality bounded.
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    let labels = [("method", method), ("route", route), ("status", status)];
    metrics::counter!(HTTP_REQUESTS_TOTAL, &labels).increment(1);
    metrics::histogram!(HTTP_REQUEST_DURATION_SECONDS, &labels)
        .record(started.elapsed().as_secs_f64());

    response
}
