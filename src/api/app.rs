//! Application listener (port 8000) — probes plus the catch-all handler.
//!
//! The catch-all is a "broken backend" simulator: whatever the method, path
//! or body, it counts the request and answers 500 with an empty body. Useful
//! for exercising gateway error handling and alerting.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    middleware,
    response::IntoResponse,
    routing::any,
    Router,
};
use tracing::info;

use crate::{metrics::ErrorKind, state::AppState};

/// Build the application-facing axum router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/live", any(super::probes::live))
        .route("/ready", any(super::probes::ready))
        .fallback(requests)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.metrics),
            super::latency::record_latency,
        ))
        .with_state(state)
}

/// Catch-all — always `500`, `Content-Type: application/json`, empty body.
pub async fn requests(State(state): State<Arc<AppState>>, uri: Uri) -> impl IntoResponse {
    info!(
        path = uri.path(),
        hostname = %state.identity.hostname,
        "processing request"
    );
    state.metrics.inc_requests();
    state.metrics.inc_error(ErrorKind::Internal);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "application/json")],
    )
}
