//! Synthetic log activity.
//!
//! When `--logs-activity` is set, a background task emits one info record
//! every [`TICK_PERIOD`] so log pipelines have something to ingest. It has
//! no connection to request serving.

use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const TICK_PERIOD: Duration = Duration::from_millis(900);

/// Emit a log record every `period` until `cancel` fires.
///
/// The first record comes one full period after start. Returns the number of
/// records emitted.
pub async fn produce(period: Duration, cancel: CancellationToken) -> u64 {
    let mut ticker = interval_at(Instant::now() + period, period);
    let mut ticks = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let chunk = Utc::now().timestamp_subsec_nanos();
                info!(chunk, "data chunk has been processed");
                ticks += 1;
            }
        }
    }

    debug!(ticks, "log activity stopped");
    ticks
}
