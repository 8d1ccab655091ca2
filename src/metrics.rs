//! Prometheus instruments for demo-app.
//!
//! All instruments live in an explicit [`Registry`] owned by [`Metrics`]
//! rather than the crate-global default registry; `main` builds one instance
//! and hands it to every handler through `Arc`.
//!
//! Metric families:
//! - `demo_app_web_requests_total`           — requests answered by the catch-all handler
//! - `demo_app_web_requests_latency_seconds` — latency of the last completed request
//! - `demo_app_web_errors_total{type}`       — errors by [`ErrorKind`]
//! - `process_*`                             — process collector (Linux only)

use std::time::Duration;

use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

const NAMESPACE: &str = "demo_app";
const SUBSYSTEM: &str = "web";

/// Closed set of `type` label values for the errors counter.
///
/// Keeping the label values in an enum bounds the series cardinality at
/// compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The catch-all handler answered 500.
    Internal,
    /// The `/metrics` endpoint failed to encode the registry.
    MetricsEncoding,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Internal => "internal",
            ErrorKind::MetricsEncoding => "metrics_encoding",
        }
    }
}

/// Request counter, latency gauge and labelled error counter.
///
/// Every recording method takes `&self`; the instruments are atomics, so
/// concurrent handlers need no extra locking.
pub struct Metrics {
    registry: Registry,
    requests_total: IntCounter,
    request_latency: Gauge,
    errors: IntCounterVec,
}

impl Metrics {
    /// Create the instruments in a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails.
    pub fn new() -> Result<Self, prometheus::Error> {
        let metrics = Self::register(Registry::new())?;

        #[cfg(target_os = "linux")]
        metrics
            .registry
            .register(Box::new(prometheus::process_collector::ProcessCollector::for_self()))?;

        Ok(metrics)
    }

    /// Register the three instruments into `registry`.
    ///
    /// Fails with [`prometheus::Error::AlreadyReg`] if any of the names is
    /// already taken in that registry.
    pub fn register(registry: Registry) -> Result<Self, prometheus::Error> {
        let requests_total = IntCounter::with_opts(
            Opts::new("requests_total", "Total number of requests processed")
                .namespace(NAMESPACE)
                .subsystem(SUBSYSTEM),
        )?;
        let request_latency = Gauge::with_opts(
            Opts::new("requests_latency_seconds", "Request latency in seconds")
                .namespace(NAMESPACE)
                .subsystem(SUBSYSTEM),
        )?;
        let errors = IntCounterVec::new(
            Opts::new("errors_total", "Total number of errors by type")
                .namespace(NAMESPACE)
                .subsystem(SUBSYSTEM),
            &["type"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_latency.clone()))?;
        registry.register(Box::new(errors.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_latency,
            errors,
        })
    }

    pub fn inc_requests(&self) {
        self.requests_total.inc();
    }

    pub fn set_latency(&self, latency: Duration) {
        self.request_latency.set(latency.as_secs_f64());
    }

    pub fn inc_error(&self, kind: ErrorKind) {
        self.errors.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn requests_total(&self) -> u64 {
        self.requests_total.get()
    }

    /// Render every registered family in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_three_families_with_namespaced_names() {
        let metrics = Metrics::register(Registry::new()).unwrap();
        metrics.inc_requests();
        metrics.set_latency(Duration::from_millis(250));
        metrics.inc_error(ErrorKind::Internal);

        let text = metrics.encode().unwrap();
        assert!(text.contains("# TYPE demo_app_web_requests_total counter"));
        assert!(text.contains("demo_app_web_requests_total 1"));
        assert!(text.contains("# TYPE demo_app_web_requests_latency_seconds gauge"));
        assert!(text.contains("demo_app_web_requests_latency_seconds 0.25"));
        assert!(text.contains("demo_app_web_errors_total{type=\"internal\"} 1"));
    }

    #[test]
    fn duplicate_registration_fails() {
        let registry = Registry::new();
        Metrics::register(registry.clone()).unwrap();

        let result = Metrics::register(registry);
        assert!(matches!(result, Err(prometheus::Error::AlreadyReg)));
    }

    #[test]
    fn separate_instances_do_not_share_counters() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();

        a.inc_requests();
        a.inc_requests();

        assert_eq!(a.requests_total(), 2);
        assert_eq!(b.requests_total(), 0);
    }

    #[test]
    fn error_kinds_map_to_distinct_labels() {
        let metrics = Metrics::register(Registry::new()).unwrap();
        metrics.inc_error(ErrorKind::Internal);
        metrics.inc_error(ErrorKind::MetricsEncoding);
        metrics.inc_error(ErrorKind::MetricsEncoding);

        let text = metrics.encode().unwrap();
        assert!(text.contains("demo_app_web_errors_total{type=\"internal\"} 1"));
        assert!(text.contains("demo_app_web_errors_total{type=\"metrics_encoding\"} 2"));
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let metrics = Metrics::register(Registry::new()).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..1_000 {
                        metrics.inc_requests();
                    }
                });
            }
        });

        assert_eq!(metrics.requests_total(), 8_000);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn process_collector_is_registered() {
        let text = Metrics::new().unwrap().encode().unwrap();
        assert!(text.contains("process_start_time_seconds"));
    }
}
