//! Background tasks.
//!
//! - reachability probe: feeds the connectivity observer
//! - periodic sync: timer-driven `sync_if_pending`
//! - retention purge: deletes old resolved records
//!
//! Each task returns its `JoinHandle`; abort it to stop the task.

use crate::api::BookingApi;
use crate::config::RetentionConfig;
use crate::connectivity::ConnectivityObserver;
use crate::orchestrator::{SyncOrchestrator, TriggerOutcome};
use crate::queue::QueueStore;
use lodge_sync_core::TriggerReason;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Spawn the reachability probe.
///
/// Every `every`, asks the API whether the remote answers and feeds the
/// result to `connectivity`. A zero interval disables the task.
pub fn spawn_probe_task<A>(
    api: Arc<A>,
    connectivity: Arc<ConnectivityObserver>,
    every: Duration,
) -> JoinHandle<()>
where
    A: BookingApi + 'static,
{
    tokio::spawn(async move {
        if every.is_zero() {
            tracing::info!("Reachability probe disabled");
            return;
        }

        tracing::info!("Reachability probe started (interval: {:?})", every);
        let mut timer = interval(every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            let reachable = api.is_reachable().await;
            tracing::trace!(reachable, "Probe");
            connectivity.set_online(reachable);
        }
    })
}

/// Spawn the periodic sync task. A zero interval disables it.
pub fn spawn_periodic_sync<Q, A>(
    orchestrator: Arc<SyncOrchestrator<Q, A>>,
    every: Duration,
) -> JoinHandle<()>
where
    Q: QueueStore + 'static,
    A: BookingApi + 'static,
{
    tokio::spawn(async move {
        if every.is_zero() {
            tracing::info!("Periodic sync disabled");
            return;
        }

        tracing::info!("Periodic sync started (interval: {:?})", every);
        let mut timer = interval(every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick is immediate; startup sync is handled separately.
        timer.tick().await;

        loop {
            timer.tick().await;
            match orchestrator.sync_if_pending(TriggerReason::Timer).await {
                TriggerOutcome::Failed(e) => tracing::error!("Periodic sync failed: {}", e),
                outcome => tracing::debug!(?outcome, "Periodic sync"),
            }
        }
    })
}

/// Spawn the retention purge task.
pub fn spawn_purge_task<Q>(queue: Arc<Q>, config: RetentionConfig) -> JoinHandle<()>
where
    Q: QueueStore + 'static,
{
    tokio::spawn(async move {
        if !config.enabled || config.interval_secs == 0 {
            tracing::info!("Retention purge disabled");
            return;
        }

        let interval_secs = config.interval_secs;
        tracing::info!(
            "Retention purge started (interval: {}s, max age: {}s)",
            interval_secs,
            config.max_age_secs
        );

        let mut timer = interval(Duration::from_secs(interval_secs));

        loop {
            timer.tick().await;

            match queue.purge_resolved(config.max_age()).await {
                Ok(deleted) => {
                    if deleted > 0 {
                        tracing::info!("Purge: deleted {} resolved writes", deleted);
                    } else {
                        tracing::debug!("Purge: nothing to delete");
                    }
                }
                Err(e) => {
                    tracing::error!("Purge error: {}", e);
                }
            }
        }
    })
}
