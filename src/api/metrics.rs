//! Prometheus `/metrics` endpoint, served from its own listener (port 8001).
//!
//! Scrapers pull the text exposition of the shared [`Metrics`] registry.
//! Keeping it on a separate port means a scrape never queues behind a slow
//! probe on the application listener.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::{
    error::Error,
    metrics::{ErrorKind, Metrics},
};

/// Build the metrics router.
pub fn router(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/metrics", get(self::metrics))
        .with_state(metrics)
}

/// `GET /metrics` — renders Prometheus text format.
pub async fn metrics(State(metrics): State<Arc<Metrics>>) -> Result<impl IntoResponse, Error> {
    let body = metrics
        .encode()
        .inspect_err(|_| metrics.inc_error(ErrorKind::MetricsEncoding))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        body,
    ))
}
