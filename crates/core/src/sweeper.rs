//! Background purge of expired files.
//!
//! Reads never depend on the sweeper: the store already hides expired
//! records. Sweeping only reclaims memory and storage, so a failed run is
//! logged and retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::store::{BlobStore, StoreError};

/// Periodically purges expired records from a blob store.
pub struct Sweeper {
    store: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl Sweeper {
    /// Creates a sweeper running every `interval`.
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            store,
            clock,
            interval,
        }
    }

    /// Purges once and returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob store fails.
    pub async fn sweep_once(&self) -> Result<usize, StoreError> {
        let removed = self.store.purge(self.clock.now()).await?;
        if removed > 0 {
            info!(removed, backend = self.store.backend_name(), "Purged expired files");
        } else {
            debug!(backend = self.store.backend_name(), "Sweep found nothing to purge");
        }
        Ok(removed)
    }

    /// Runs until `shutdown` is cancelled. The first sweep happens
    /// immediately.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = self.interval.as_secs(), "Sweeper started");
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        warn!(error = %e, "Sweep failed");
                    }
                }
            }
        }
        info!("Sweeper stopped");
    }

    /// Spawns [`Sweeper::run`] on the current runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
