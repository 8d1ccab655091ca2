//! Error taxonomy for demo-app.
//!
//! Almost every variant is startup-fatal: `main` logs it and exits non-zero.
//! The only error that can surface while serving is a metrics encoding
//! failure, which is why [`Error`] also implements [`IntoResponse`] — the
//! `/metrics` handler can propagate it with `?`.

use std::io;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The application listener has no address to bind.
    #[error("listen address couldn't be empty")]
    EmptyListenAddr,

    #[error("failed to bind {name} server to {addr}")]
    Bind {
        name: &'static str,
        addr: String,
        #[source]
        source: io::Error,
    },

    /// A server stopped without anyone asking it to.
    #[error("{name} server stopped unexpectedly")]
    Stopped {
        name: &'static str,
        #[source]
        source: Option<io::Error>,
    },

    #[error("failed to serialize identity payload")]
    Payload(#[from] serde_json::Error),

    #[error("metrics registry error")]
    Metrics(#[from] prometheus::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "handler error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}
