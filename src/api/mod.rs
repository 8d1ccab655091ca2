//! HTTP surface: the application router (probes + catch-all) and the
//! metrics router. Each is served from its own listener.

pub mod app;
pub mod latency;
pub mod metrics;
pub mod probes;
