//! Request latency middleware for the application listener.
//!
//! Times each request and stores the elapsed seconds in the
//! `demo_app_web_requests_latency_seconds` gauge. A gauge only holds one
//! value, so a scrape sees the latency of the most recently completed
//! request.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;

use crate::metrics::Metrics;

/// Axum middleware that records request latency into [`Metrics`].
///
/// Applied with `middleware::from_fn_with_state` over every route and the
/// fallback, so probe delays show up in the gauge too.
pub async fn record_latency(
    State(metrics): State<Arc<Metrics>>,
    req: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let response = next.run(req).await;
    metrics.set_latency(started.elapsed());
    response
}
