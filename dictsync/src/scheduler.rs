use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::concurrency::shutdown::ShutdownRx;
use crate::sink::base::DictionarySink;
use crate::source::base::ChangeSource;
use crate::syncer::DictionarySyncer;

/// Runs a [`DictionarySyncer`] tick every `interval` until shutdown.
///
/// The first tick fires right away. Ticks are spawned rather than awaited, so a slow pass does
/// not hold back the next tick; the syncer drops a pass whose kind is still busy.
#[derive(Debug)]
pub struct SyncScheduler<S, K> {
    syncer: DictionarySyncer<S, K>,
    interval: Duration,
    shutdown_rx: ShutdownRx,
}

impl<S, K> SyncScheduler<S, K>
where
    S: ChangeSource + Clone + Send + Sync + 'static,
    K: DictionarySink + Clone + Send + Sync + 'static,
{
    pub fn new(syncer: DictionarySyncer<S, K>, interval: Duration, shutdown_rx: ShutdownRx) -> Self {
        Self {
            syncer,
            interval,
            shutdown_rx,
        }
    }

    /// Ticks until the shutdown signal fires, then waits for the ticks still in flight.
    pub async fn run(mut self) {
        info!(interval_secs = self.interval.as_secs(), "starting sync scheduler");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    info!("shutdown signal received, stopping sync scheduler");
                    break;
                }

                _ = ticker.tick() => {
                    let syncer = self.syncer.clone();
                    in_flight.spawn(async move { syncer.run_tick().await });
                }

                Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(err) = result {
                        error!(error = %err, "sync tick task failed");
                    }
                }
            }
        }

        while let Some(result) = in_flight.join_next().await {
            if let Err(err) = result {
                error!(error = %err, "sync tick task failed");
            }
        }

        info!("sync scheduler stopped");
    }
}
