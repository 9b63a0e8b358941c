//! Background loops
//!
//! Long-running tasks the agent binary spawns next to a [`LogStorage`]:
//! a periodic flush, and a monitor that turns readiness probes into the
//! readiness signal the storage's watcher listens to.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::repository::RemoteRepository;
use crate::service::storage::{FlushOutcome, LogStorage};
use crate::signal::Signal;

/// Flushes `storage` every `interval` until it is stopped
pub fn spawn_periodic_flush(storage: LogStorage, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            if storage.is_stopped() {
                debug!("Storage stopped, ending periodic flush");
                break;
            }

            match storage.flush().await {
                FlushOutcome::Empty => debug!("No logs to flush"),
                outcome => debug!("Periodic flush: {:?}", outcome),
            }
        }
    })
}

/// Probes the remote store every `interval` and fires `signal` whenever it
/// goes from not ready (or unknown) to ready
///
/// While the store stays ready the signal is fired again on every probe that
/// finds someone subscribed, so a watcher armed in the meantime is not left
/// waiting for the next outage. Runs until aborted.
pub fn spawn_readiness_monitor(
    remote: Arc<dyn RemoteRepository>,
    signal: Signal,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut was_ready = false;

        loop {
            ticker.tick().await;

            let ready = remote.probe_ready().await;
            if ready {
                if !was_ready {
                    info!("Remote store is ready");
                    signal.notify();
                } else if signal.subscriber_count() > 0 {
                    debug!("Remote store still ready, notifying waiting subscribers");
                    signal.notify();
                }
            } else if was_ready {
                warn!("Remote store is no longer ready");
            }
            was_ready = ready;
        }
    })
}
