//! Liveness and readiness probes with artificial latency.
//!
//! Both probes always succeed, but only after sleeping for a random
//! duration. That lets orchestrator timeout and restart policies be
//! exercised against a service that starts slowly or stalls now and then.

use std::{
    ops::Range,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use axum::extract::State;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use crate::state::AppState;

/// `/live` sleeps for a duration in this range before answering.
pub const LIVENESS_DELAY: Range<Duration> = Duration::ZERO..Duration::from_secs(30);

/// `/ready` sleeps for a duration in this range before answering.
pub const READINESS_DELAY: Range<Duration> = Duration::from_secs(30)..Duration::from_secs(90);

const PROBE_BODY: &str = "OK\n";

/// Process-wide random source for probe delays.
///
/// Seeded once; the lock is held only for a single draw and never across an
/// await point.
pub struct ProbeDelays {
    rng: Mutex<StdRng>,
}

impl ProbeDelays {
    /// Seed from the wall clock, so delays differ between runs.
    pub fn from_clock() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self::seeded(nanos)
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Draw a delay uniformly from `range`, at millisecond resolution.
    ///
    /// The result is always `>= range.start` and `< range.end`.
    pub fn draw(&self, range: &Range<Duration>) -> Duration {
        let low = range.start.as_millis() as u64;
        let high = range.end.as_millis() as u64;
        let millis = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(low..high);
        Duration::from_millis(millis)
    }
}

/// `/live` — answers `200 OK` after 0–30 s.
pub async fn live(State(state): State<Arc<AppState>>) -> &'static str {
    delayed_ok(&state, "live", &LIVENESS_DELAY).await
}

/// `/ready` — answers `200 OK` after 30–90 s.
pub async fn ready(State(state): State<Arc<AppState>>) -> &'static str {
    delayed_ok(&state, "ready", &READINESS_DELAY).await
}

async fn delayed_ok(state: &AppState, probe: &'static str, range: &Range<Duration>) -> &'static str {
    let delay = state.delays.draw(range);
    debug!(probe, delay_ms = delay.as_millis() as u64, "delaying probe response");
    tokio::time::sleep(delay).await;
    PROBE_BODY
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tokio::time::Instant;
    use tower::ServiceExt;

    use super::*;
    use crate::state::test_utils::app_state;

    async fn probe(uri: &str) -> (StatusCode, String, Duration) {
        let app = crate::api::app::router(app_state());
        let started = Instant::now();

        let resp = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let elapsed = started.elapsed();

        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap(), elapsed)
    }

    #[test]
    fn draws_stay_within_range() {
        let delays = ProbeDelays::seeded(42);

        for _ in 0..10_000 {
            let live = delays.draw(&LIVENESS_DELAY);
            assert!(live < Duration::from_secs(30), "liveness delay {live:?}");

            let ready = delays.draw(&READINESS_DELAY);
            assert!(ready >= Duration::from_secs(30), "readiness delay {ready:?}");
            assert!(ready < Duration::from_secs(90), "readiness delay {ready:?}");
        }
    }

    #[test]
    fn different_seeds_give_different_sequences() {
        let a = ProbeDelays::seeded(1);
        let b = ProbeDelays::seeded(2);

        let a: Vec<_> = (0..16).map(|_| a.draw(&READINESS_DELAY)).collect();
        let b: Vec<_> = (0..16).map(|_| b.draw(&READINESS_DELAY)).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn same_seed_repeats_sequence() {
        let a = ProbeDelays::seeded(99);
        let b = ProbeDelays::seeded(99);

        for _ in 0..16 {
            assert_eq!(a.draw(&LIVENESS_DELAY), b.draw(&LIVENESS_DELAY));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn live_returns_ok_within_liveness_window() {
        for _ in 0..5 {
            let (status, body, elapsed) = probe("/live").await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, "OK\n");
            assert!(elapsed < Duration::from_secs(30), "took {elapsed:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ready_returns_ok_within_readiness_window() {
        for _ in 0..5 {
            let (status, body, elapsed) = probe("/ready").await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, "OK\n");
            assert!(elapsed >= Duration::from_secs(30), "took {elapsed:?}");
            assert!(elapsed < Duration::from_secs(90), "took {elapsed:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn probes_answer_any_method() {
        let app = crate::api::app::router(app_state());
        let resp = app
            .oneshot(Request::post("/live").body(Body::from("ignored")).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test(start_paused = true)]
    async fn probes_do_not_touch_request_counter() {
        let state = app_state();
        let app = crate::api::app::router(Arc::clone(&state));

        app.clone()
            .oneshot(Request::get("/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        app.oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(state.metrics.requests_total(), 0);
    }
}
