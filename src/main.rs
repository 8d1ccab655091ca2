use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

mod activity;
mod api;
mod config;
mod error;
mod identity;
mod lifecycle;
mod metrics;
mod state;

pub use config::Config;

use api::probes::ProbeDelays;
use lifecycle::{Lifecycle, Server};
use metrics::Metrics;
use state::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Set by the release build, e.g. `BUILD_TIME=$(date -u +%FT%TZ) cargo build`.
const BUILD_TIME: &str = match option_env!("BUILD_TIME") {
    Some(time) => time,
    None => "unknown",
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.logs_pretty);

    info!(
        version = VERSION,
        build_time = BUILD_TIME,
        "initializing the application"
    );

    run(config).await
}

/// Human-readable output by default; one JSON object per line otherwise.
fn init_tracing(pretty: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "demo_app=info,tower_http=warn".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true);

    if pretty {
        builder.init();
    } else {
        builder.json().init();
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    let metrics = Arc::new(Metrics::new().context("failed to register metrics")?);
    let state = Arc::new(
        AppState::new(Arc::clone(&metrics), ProbeDelays::from_clock(), VERSION)
            .context("failed to build request handler")?,
    );

    // Request tracing on both listeners
    let trace_layer = || {
        tower_http::trace::TraceLayer::new_for_http()
            .make_span_with(tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO))
            .on_response(tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO))
    };

    let grace = config.shutdown_timeout();
    let mut lifecycle = Lifecycle::new();
    lifecycle.register(
        Server::new(
            "web",
            &config.listen_addr,
            api::app::router(state).layer(trace_layer()),
        ),
        grace,
    );
    match config.metrics_addr() {
        Some(addr) => lifecycle.register(
            Server::new(
                "metrics",
                addr,
                api::metrics::router(Arc::clone(&metrics)).layer(trace_layer()),
            ),
            grace,
        ),
        None => info!("metrics address is empty, metrics server disabled"),
    }

    let running = lifecycle.run().await?;
    for (name, address) in running.local_addrs() {
        info!(server = name, %address, "server initialized");
    }

    let activity = CancellationToken::new();
    if config.logs_activity {
        tokio::spawn(activity::produce(activity::TICK_PERIOD, activity.clone()));
    }

    let result = running.wait_for_shutdown().await;
    activity.cancel();
    result?;

    info!(
        requests_total = metrics.requests_total(),
        "shut down gracefully"
    );
    Ok(())
}
