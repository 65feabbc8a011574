//! # pcms-api: HTTP Service for Page-Section Content
//!
//! ## API Surface
//!
//! | Prefix                 | Module                   | Auth            |
//! |------------------------|--------------------------|-----------------|
//! | `/v1/components/*`     | [`routes::components`]   | bearer          |
//! | `/v1/orgs/*/sections`  | [`routes::sections`]     | bearer          |
//! | `/v1/sections/*`       | [`routes::sections`]     | bearer          |
//! | `/v1/preview/tokens`   | [`routes::preview`]      | bearer          |
//! | `/v1/preview/content`  | [`routes::preview`]      | preview token   |
//! | `/health/*`, `/metrics`, `/openapi.json` | here   | none            |
//!
//! ## Middleware Stack (outermost first)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Maximum accepted request body.
pub const BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

/// Assemble the application router.
///
/// Health probes, `/metrics`, `/openapi.json`, and the renderer's preview
/// content endpoint are mounted outside the bearer-auth middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let metrics_on = state.config.metrics_enabled;

    let api = Router::new()
        .merge(routes::components::router())
        .merge(routes::sections::router())
        .merge(routes::preview::router())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(from_fn(auth::auth_middleware))
        .layer(Extension(auth_config));

    let mut unauthenticated = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .merge(routes::preview::public_router())
        .merge(openapi::router());

    if state.metrics.is_some() {
        unauthenticated = unauthenticated.route("/metrics", get(prometheus_metrics));
    }

    let mut router = Router::new().merge(unauthenticated).merge(api);
    if metrics_on {
        router = router.layer(from_fn(middleware::metrics::metrics_middleware));
    }
    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// GET /health/liveness
async fn liveness() -> &'static str {
    "ok"
}

/// GET /health/readiness: checks the database when one is configured.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(error = %e, "readiness check failed: database unreachable");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable");
        }
    }
    (StatusCode::OK, "ready")
}

/// GET /metrics: Prometheus text exposition.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}
