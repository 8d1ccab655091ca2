//! Configuration types for demo-app.
//!
//! Every setting is a command-line flag with an environment-variable
//! fallback, so the same binary can be driven from a container spec or a
//! shell. Config is validated before the server opens any ports.
//!
//! ```text
//! demo-app --listen-addr 0.0.0.0:8000 --metrics-addr "" --logs-pretty false
//! ```

use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::error::Error;

/// Top-level service configuration.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Config {
    /// Address to serve http from.
    #[arg(long, env = "DEMO_APP_LISTEN_ADDR", default_value = "0.0.0.0:8000")]
    pub listen_addr: String,

    /// Address to serve metrics from. Empty disables the metrics listener.
    #[arg(long, env = "DEMO_APP_METRICS_ADDR", default_value = "0.0.0.0:8001")]
    pub metrics_addr: String,

    /// Produce fake log activity.
    #[arg(long, env = "DEMO_APP_LOGS_ACTIVITY")]
    pub logs_activity: bool,

    /// Human-readable logs; `false` switches to one JSON object per line.
    #[arg(
        long,
        env = "DEMO_APP_LOGS_PRETTY",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub logs_pretty: bool,

    /// Grace period, in seconds, each server gets to drain on shutdown.
    #[arg(long, env = "DEMO_APP_SHUTDOWN_TIMEOUT", default_value_t = 10)]
    pub shutdown_timeout: u64,
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        if self.listen_addr.trim().is_empty() {
            return Err(Error::EmptyListenAddr);
        }
        Ok(())
    }

    /// The metrics listener address, or `None` when metrics are disabled.
    pub fn metrics_addr(&self) -> Option<&str> {
        Some(self.metrics_addr.trim()).filter(|addr| !addr.is_empty())
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}
