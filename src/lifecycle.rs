//! Startup and graceful shutdown for a set of independent HTTP listeners.
//!
//! [`Lifecycle`] collects [`Server`] registrations, [`Lifecycle::run`] binds
//! every listener and spawns one serving task per server, and
//! [`Running::wait_for_shutdown`] blocks until SIGINT/SIGTERM before draining
//! all servers concurrently.
//!
//! Each server drains under its own timeout. A server still busy when its
//! timeout expires has its serving task aborted; this is logged and never
//! turned into an error, so shutdown always completes.

use std::{future::Future, net::SocketAddr, time::Duration};

use axum::Router;
use futures_util::future::join_all;
use tokio::{net::TcpListener, signal, sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::Error;

/// An HTTP server waiting to be started: a name for logs, an address to
/// bind and the router to serve.
pub struct Server {
    name: &'static str,
    addr: String,
    router: Router,
}

impl Server {
    pub fn new(name: &'static str, addr: impl Into<String>, router: Router) -> Self {
        Self {
            name,
            addr: addr.into(),
            router,
        }
    }
}

/// Registration phase. Consumed by [`run`][Self::run], so nothing can be
/// registered after the servers start.
#[derive(Default)]
pub struct Lifecycle {
    servers: Vec<(Server, Duration)>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a server that gets `shutdown_timeout` to drain in-flight requests.
    pub fn register(&mut self, server: Server, shutdown_timeout: Duration) {
        self.servers.push((server, shutdown_timeout));
    }

    /// Bind every registered listener, then start serving on all of them.
    ///
    /// Returns as soon as the serving tasks are spawned. All binds happen
    /// before any server starts, so a bind failure leaves nothing running.
    ///
    /// # Errors
    ///
    /// [`Error::Bind`] if any address cannot be bound.
    pub async fn run(self) -> Result<Running, Error> {
        let mut bound = Vec::with_capacity(self.servers.len());
        for (server, shutdown_timeout) in self.servers {
            let bind_error = |source| Error::Bind {
                name: server.name,
                addr: server.addr.clone(),
                source,
            };
            let listener = TcpListener::bind(server.addr.as_str())
                .await
                .map_err(bind_error)?;
            let local_addr = listener.local_addr().map_err(bind_error)?;
            bound.push((server, shutdown_timeout, listener, local_addr));
        }

        let (failures_tx, failures) = mpsc::unbounded_channel();
        let servers = bound
            .into_iter()
            .map(|(server, shutdown_timeout, listener, local_addr)| {
                RunningServer::spawn(
                    server,
                    listener,
                    local_addr,
                    shutdown_timeout,
                    failures_tx.clone(),
                )
            })
            .collect();

        Ok(Running { servers, failures })
    }
}

/// Serving phase.
pub struct Running {
    servers: Vec<RunningServer>,
    failures: mpsc::UnboundedReceiver<Error>,
}

impl Running {
    /// Name and bound address of every running server, in registration order.
    pub fn local_addrs(&self) -> Vec<(&'static str, SocketAddr)> {
        self.servers
            .iter()
            .map(|server| (server.name, server.local_addr))
            .collect()
    }

    /// Block until SIGINT or SIGTERM, then drain every server.
    ///
    /// # Errors
    ///
    /// [`Error::Stopped`] if a server stops on its own before any signal
    /// arrives. The remaining servers are aborted.
    pub async fn wait_for_shutdown(self) -> Result<(), Error> {
        self.wait_for(shutdown_signal()).await
    }

    /// Same as [`wait_for_shutdown`][Self::wait_for_shutdown], with shutdown
    /// triggered by `signal` completing.
    pub async fn wait_for<F>(mut self, signal: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = signal => {
                info!("shutdown signal received");
            }
            Some(failure) = self.failures.recv() => {
                for server in &self.servers {
                    server.handle.abort();
                }
                return Err(failure);
            }
        }

        for server in &self.servers {
            server.cancel.cancel();
        }
        join_all(self.servers.into_iter().map(RunningServer::drain)).await;
        Ok(())
    }
}

struct RunningServer {
    name: &'static str,
    local_addr: SocketAddr,
    shutdown_timeout: Duration,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RunningServer {
    fn spawn(
        server: Server,
        listener: TcpListener,
        local_addr: SocketAddr,
        shutdown_timeout: Duration,
        failures: mpsc::UnboundedSender<Error>,
    ) -> Self {
        let name = server.name;
        let cancel = CancellationToken::new();
        let shutdown = cancel.clone();

        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, server.router)
                .with_graceful_shutdown(shutdown.clone().cancelled_owned())
                .await;

            if shutdown.is_cancelled() {
                if let Err(e) = result {
                    warn!(server = name, error = %e, "server error during shutdown");
                }
                return;
            }

            let failure = Error::Stopped {
                name,
                source: result.err(),
            };
            error!(server = name, error = %failure, "server stopped without a shutdown request");
            let _ = failures.send(failure);
        });

        Self {
            name,
            local_addr,
            shutdown_timeout,
            cancel,
            handle,
        }
    }

    /// Wait for the serving task to finish draining, aborting it once
    /// `shutdown_timeout` has passed.
    async fn drain(self) {
        let Self {
            name,
            shutdown_timeout,
            mut handle,
            ..
        } = self;

        match tokio::time::timeout(shutdown_timeout, &mut handle).await {
            Ok(Ok(())) => info!(server = name, "server stopped"),
            Ok(Err(e)) => warn!(server = name, error = %e, "server task failed during shutdown"),
            Err(_) => {
                handle.abort();
                warn!(
                    server = name,
                    timeout_ms = shutdown_timeout.as_millis() as u64,
                    "server did not drain in time, forcing close"
                );
            }
        }
    }
}

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
///
/// A handler that cannot be installed is logged and never fires; the other
/// one still works.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
