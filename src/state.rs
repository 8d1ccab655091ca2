use std::sync::Arc;

use tracing::info;

use crate::{api::probes::ProbeDelays, error::Error, identity::Identity, metrics::Metrics};

/// Shared application state injected into every request handler via [`axum::extract::State`].
pub struct AppState {
    pub metrics: Arc<Metrics>,
    /// Random source for probe delays.
    pub delays: ProbeDelays,
    /// Built once at startup. Not part of any response: the catch-all
    /// handler answers with an empty body.
    pub identity: Identity,
}

impl AppState {
    /// Discover the instance identity and check that it encodes.
    ///
    /// # Errors
    ///
    /// [`Error::Payload`] if the identity cannot be serialized. That points
    /// at a defect in the payload type, so callers treat it as fatal.
    pub fn new(metrics: Arc<Metrics>, delays: ProbeDelays, version: &str) -> Result<Self, Error> {
        Self::with_identity(metrics, delays, Identity::discover(version))
    }

    pub fn with_identity(
        metrics: Arc<Metrics>,
        delays: ProbeDelays,
        identity: Identity,
    ) -> Result<Self, Error> {
        let payload = identity.to_json()?;
        info!(
            hostname = %identity.hostname,
            ips = ?identity.ips,
            version = %identity.version,
            payload_bytes = payload.len(),
            "identity payload built"
        );

        Ok(Self {
            metrics,
            delays,
            identity,
        })
    }
}
