//! Idle reaper for in-flight request markers.
//!
//! A marker that outlives `idle_timeout` belongs to a request that never
//! released its guard (a hung call, an aborted task). The reaper sweeps
//! such markers every `interval` until its cancellation token fires.

use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::active::ActiveRequests;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to a running reaper task.
#[derive(Debug)]
pub struct ReaperHandle {
    cancel: CancellationToken,
    handle: JoinHandle<usize>,
}

impl ReaperHandle {
    /// Token that stops the reaper; cancelling a parent token also stops it.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Stop the reaper and wait for it to exit. Returns the total number of
    /// markers it removed, or 0 if the task died.
    pub async fn shutdown(self) -> usize {
        self.cancel.cancel();
        match self.handle.await {
            Ok(total) => total,
            Err(err) => {
                warn!(error = %err, "Idle reaper task did not exit cleanly");
                0
            }
        }
    }
}

/// Spawn the periodic sweep on the current runtime.
///
/// The first sweep runs one full `interval` after spawning. A zero
/// `interval` is raised to one millisecond.
pub fn spawn_idle_reaper(
    active: ActiveRequests,
    interval: Duration,
    idle_timeout: Duration,
    cancel: CancellationToken,
) -> ReaperHandle {
    let interval = interval.max(MIN_SWEEP_INTERVAL);
    let token = cancel.clone();
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        let mut total = 0usize;
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(total_removed = total, "Idle reaper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = active.sweep_idle(Instant::now(), idle_timeout);
                    for user_id in &removed {
                        info!(user_id = %user_id, "Cleaned up inactive session");
                    }
                    total += removed.len();
                }
            }
        }
        total
    });

    ReaperHandle { cancel, handle }
}
