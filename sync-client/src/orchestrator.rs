//! Sync orchestration.
//!
//! The orchestrator decides when passes run. Triggers come from the user
//! ([`SyncOrchestrator::trigger_sync`]), from connectivity coming back
//! ([`SyncOrchestrator::start`]), and from timers and producers
//! ([`SyncOrchestrator::sync_if_pending`]). At most one pass runs at a time;
//! a trigger that arrives during a pass is dropped, not queued.

use crate::api::BookingApi;
use crate::connectivity::ConnectivityObserver;
use crate::engine::ReconciliationEngine;
use crate::error::StorageError;
use crate::notify::{Registry, Subscription};
use crate::queue::QueueStore;
use lodge_sync_core::{decide, DeliveryOutcome, StatusPolicy, TriggerDecision, TriggerReason};
use lodge_sync_types::{LocalId, Payload, SyncProgress, SyncSummary};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Delay before the follow-up sync scheduled by [`SyncOrchestrator::submit`].
pub const DEFAULT_FOLLOW_UP_DELAY: Duration = Duration::from_secs(1);

/// Result of a sync request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A pass ran to completion.
    Completed(SyncSummary),
    /// Another pass was already in flight; nothing was done.
    AlreadyRunning,
    /// Offline; nothing was done.
    Offline,
    /// Automatic trigger with an empty queue; nothing was done.
    NothingPending,
    /// The pass could not run (queue unreadable).
    Failed(String),
}

/// Result of [`SyncOrchestrator::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The remote accepted the booking directly.
    Delivered,
    /// The remote refused the booking; it was not queued.
    Rejected {
        /// Status code and response excerpt.
        reason: String,
    },
    /// The booking was saved offline and will be delivered later.
    Queued(LocalId),
}

/// Resets the running flag when a pass ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the engine and decides when it runs.
pub struct SyncOrchestrator<Q, A> {
    queue: Arc<Q>,
    connectivity: Arc<ConnectivityObserver>,
    engine: ReconciliationEngine<Q, A>,
    progress: Registry<SyncProgress>,
    running: AtomicBool,
    follow_up_delay: Duration,
}

impl<Q, A> SyncOrchestrator<Q, A>
where
    Q: QueueStore + 'static,
    A: BookingApi + 'static,
{
    /// Wire an orchestrator from its collaborators.
    pub fn new(queue: Arc<Q>, api: Arc<A>, connectivity: Arc<ConnectivityObserver>) -> Self {
        let progress = Registry::new();
        let engine = ReconciliationEngine::new(Arc::clone(&queue), api, progress.clone());
        Self {
            queue,
            connectivity,
            engine,
            progress,
            running: AtomicBool::new(false),
            follow_up_delay: DEFAULT_FOLLOW_UP_DELAY,
        }
    }

    /// Use a different status policy.
    pub fn with_policy(mut self, policy: StatusPolicy) -> Self {
        self.engine = self.engine.with_policy(policy);
        self
    }

    /// Use a different per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.engine = self.engine.with_request_timeout(timeout);
        self
    }

    /// Use a different delay before the follow-up sync after a queued submit.
    pub fn with_follow_up_delay(mut self, delay: Duration) -> Self {
        self.follow_up_delay = delay;
        self
    }

    /// Listen for progress events of every pass.
    pub fn on_progress<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SyncProgress) + Send + Sync + 'static,
    {
        self.progress.subscribe(listener)
    }

    /// True while a pass is in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Number of writes still waiting for delivery.
    pub async fn pending_count(&self) -> Result<u64, StorageError> {
        self.queue.pending_count().await
    }

    /// The connectivity observer this orchestrator follows.
    pub fn connectivity(&self) -> &Arc<ConnectivityObserver> {
        &self.connectivity
    }

    /// User-initiated sync. Runs even if the queue looks empty.
    pub async fn trigger_sync(&self) -> TriggerOutcome {
        self.request(TriggerReason::Manual).await
    }

    /// Automatic sync: runs only when online and something is pending.
    pub async fn sync_if_pending(&self, reason: TriggerReason) -> TriggerOutcome {
        self.request(reason).await
    }

    async fn request(&self, reason: TriggerReason) -> TriggerOutcome {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            tracing::debug!(%reason, "Sync already in progress, ignoring trigger");
            return TriggerOutcome::AlreadyRunning;
        };

        let online = self.connectivity.current();
        let pending = if online && reason != TriggerReason::Manual {
            match self.queue.pending_count().await {
                Ok(count) => Some(count),
                Err(e) => {
                    tracing::error!(%reason, "Cannot count pending writes: {}", e);
                    self.progress.emit(&SyncProgress::Error {
                        message: e.to_string(),
                    });
                    return TriggerOutcome::Failed(e.to_string());
                }
            }
        } else {
            None
        };

        match decide(reason, online, pending) {
            TriggerDecision::SkipOffline => {
                tracing::debug!(%reason, "Offline, not syncing");
                TriggerOutcome::Offline
            }
            TriggerDecision::SkipEmpty => {
                tracing::trace!(%reason, "Nothing pending");
                TriggerOutcome::NothingPending
            }
            TriggerDecision::Run => {
                tracing::info!(%reason, "Starting sync");
                match self.engine.run().await {
                    Ok(summary) => TriggerOutcome::Completed(summary),
                    Err(e) => TriggerOutcome::Failed(e.to_string()),
                }
            }
        }
    }

    /// Follow connectivity: every transition to online requests a sync.
    ///
    /// Passes run on `runtime`. Dropping the returned subscription stops the
    /// behaviour; the subscription does not keep the orchestrator alive.
    pub fn start(self: &Arc<Self>, runtime: Handle) -> Subscription {
        let this = Arc::downgrade(self);
        self.connectivity.subscribe(move |online| {
            if !online {
                return;
            }
            let Some(orchestrator) = this.upgrade() else {
                return;
            };
            runtime.spawn(async move {
                let outcome = orchestrator
                    .sync_if_pending(TriggerReason::Reconnected)
                    .await;
                tracing::debug!(?outcome, "Reconnect sync finished");
            });
        })
    }

    /// Submit a booking, delivering directly when possible.
    ///
    /// Online, the remote is tried first: acceptance and rejection are
    /// returned as-is. Offline or on a transient failure the booking is
    /// queued; if online, a follow-up sync is scheduled shortly after.
    pub async fn submit(self: &Arc<Self>, payload: Payload) -> Result<SubmitOutcome, StorageError> {
        let online = self.connectivity.current();
        if online {
            match self.engine.attempt(&payload).await {
                DeliveryOutcome::Accepted => {
                    tracing::debug!("Booking delivered directly");
                    return Ok(SubmitOutcome::Delivered);
                }
                DeliveryOutcome::Rejected { reason } => {
                    tracing::warn!(reason = %reason, "Booking rejected by remote");
                    return Ok(SubmitOutcome::Rejected { reason });
                }
                DeliveryOutcome::Deferred { reason } => {
                    tracing::info!("Direct delivery failed ({}), saving offline", reason);
                }
            }
        }

        let local_id = self.queue.enqueue(&payload).await?;
        tracing::info!(local_id = %local_id, "Booking saved offline");

        if online {
            let orchestrator = Arc::clone(self);
            let delay = self.follow_up_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                orchestrator
                    .sync_if_pending(TriggerReason::AfterEnqueue)
                    .await;
            });
        }

        Ok(SubmitOutcome::Queued(local_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockBookingApi, MockReply};
    use crate::queue::SqliteQueue;
    use serde_json::json;
    use std::sync::Mutex;

    fn booking(name: &str) -> Payload {
        match json!({ "name": name, "id_or_telephone": "0200000000", "room_no": 2 }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    struct Harness {
        queue: Arc<SqliteQueue>,
        api: MockBookingApi,
        connectivity: Arc<ConnectivityObserver>,
        orchestrator: Arc<SyncOrchestrator<SqliteQueue, MockBookingApi>>,
    }

    async fn harness(online: bool) -> Harness {
        harness_with_timeout(online, Duration::from_millis(200)).await
    }

    async fn harness_with_timeout(online: bool, request_timeout: Duration) -> Harness {
        let queue = Arc::new(SqliteQueue::in_memory().await.unwrap());
        let api = MockBookingApi::new();
        let connectivity = Arc::new(ConnectivityObserver::new(online));
        let orchestrator = Arc::new(
            SyncOrchestrator::new(
                Arc::clone(&queue),
                Arc::new(api.clone()),
                Arc::clone(&connectivity),
            )
            .with_request_timeout(request_timeout)
            .with_follow_up_delay(Duration::from_millis(10)),
        );
        Harness {
            queue,
            api,
            connectivity,
            orchestrator,
        }
    }

    fn record_progress(
        orchestrator: &SyncOrchestrator<SqliteQueue, MockBookingApi>,
    ) -> (Arc<Mutex<Vec<SyncProgress>>>, Subscription) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sub = orchestrator.on_progress({
            let events = Arc::clone(&events);
            move |p| events.lock().unwrap().push(p.clone())
        });
        (events, sub)
    }

    /// Poll until `check` holds or a second passes.
    async fn eventually<F: Fn() -> bool>(check: F) {
        for _ in 0..100 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached within 1s");
    }

    // ===========================================
    // Trigger decisions
    // ===========================================

    #[tokio::test]
    async fn offline_trigger_does_nothing() {
        let h = harness(false).await;
        h.queue.enqueue(&booking("A")).await.unwrap();

        assert_eq!(h.orchestrator.trigger_sync().await, TriggerOutcome::Offline);
        assert!(h.api.requests().is_empty());
        assert_eq!(h.orchestrator.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn manual_trigger_runs_on_empty_queue() {
        let h = harness(true).await;
        let (events, _sub) = record_progress(&h.orchestrator);

        assert_eq!(
            h.orchestrator.trigger_sync().await,
            TriggerOutcome::Completed(SyncSummary::default())
        );
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn automatic_trigger_skips_empty_queue() {
        let h = harness(true).await;
        let (events, _sub) = record_progress(&h.orchestrator);

        assert_eq!(
            h.orchestrator.sync_if_pending(TriggerReason::Timer).await,
            TriggerOutcome::NothingPending
        );
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreadable_record_does_not_start_passes() {
        let h = harness(true).await;
        h.queue.insert_unreadable("offline_1_broken000").await;
        let (events, _sub) = record_progress(&h.orchestrator);

        for reason in [TriggerReason::Timer, TriggerReason::Reconnected] {
            assert_eq!(
                h.orchestrator.sync_if_pending(reason).await,
                TriggerOutcome::NothingPending
            );
        }
        assert_eq!(h.orchestrator.pending_count().await.unwrap(), 0);
        assert!(events.lock().unwrap().is_empty());
        assert!(h.api.requests().is_empty());
    }

    #[tokio::test]
    async fn flag_is_released_after_each_pass() {
        let h = harness(true).await;
        h.queue.enqueue(&booking("A")).await.unwrap();

        assert!(matches!(
            h.orchestrator.trigger_sync().await,
            TriggerOutcome::Completed(_)
        ));
        assert!(!h.orchestrator.is_running());
        assert!(matches!(
            h.orchestrator.trigger_sync().await,
            TriggerOutcome::Completed(_)
        ));
    }

    // ===========================================
    // Overlapping triggers
    // ===========================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn overlapping_trigger_is_a_noop() {
        // The held delivery must not time out however slow this task is
        let h = harness_with_timeout(true, Duration::from_secs(10)).await;
        h.queue.enqueue(&booking("A")).await.unwrap();
        h.queue.enqueue(&booking("B")).await.unwrap();
        h.api.hold();

        let first = tokio::spawn({
            let orchestrator = Arc::clone(&h.orchestrator);
            async move { orchestrator.trigger_sync().await }
        });

        // Wait until the first pass is blocked inside its first delivery
        eventually(|| h.api.calls_started() == 1).await;
        assert!(h.orchestrator.is_running());

        assert_eq!(
            h.orchestrator.trigger_sync().await,
            TriggerOutcome::AlreadyRunning
        );
        assert_eq!(
            h.orchestrator
                .sync_if_pending(TriggerReason::Reconnected)
                .await,
            TriggerOutcome::AlreadyRunning
        );

        h.api.release();
        let outcome = first.await.unwrap();
        assert_eq!(
            outcome,
            TriggerOutcome::Completed(SyncSummary {
                succeeded: 2,
                failed: 0,
                deferred: 0
            })
        );

        // Each booking delivered exactly once
        assert_eq!(h.api.requests(), vec![booking("A"), booking("B")]);
        assert_eq!(h.queue.pending_count().await.unwrap(), 0);
    }

    // ===========================================
    // Reconnect scenarios
    // ===========================================

    #[tokio::test]
    async fn reconnect_delivers_offline_queue_in_order() {
        let h = harness(false).await;
        let _auto = h.orchestrator.start(Handle::current());
        let (events, _sub) = record_progress(&h.orchestrator);

        h.queue.enqueue(&booking("first")).await.unwrap();
        let second = h.queue.enqueue(&booking("second")).await.unwrap();
        h.queue.enqueue(&booking("third")).await.unwrap();
        assert_eq!(h.orchestrator.pending_count().await.unwrap(), 3);

        h.api.queue_replies([
            MockReply::Status(201),
            MockReply::StatusWithBody(400, r#"{"room_no": ["Room is occupied"]}"#.into()),
            MockReply::Status(201),
        ]);
        h.connectivity.set_online(true);

        eventually(|| {
            events
                .lock()
                .unwrap()
                .last()
                .is_some_and(SyncProgress::is_terminal)
        })
        .await;

        assert_eq!(
            *events.lock().unwrap().last().unwrap(),
            SyncProgress::Done {
                succeeded: 2,
                failed: 1,
                deferred: 0,
                total: 3
            }
        );
        assert_eq!(h.orchestrator.pending_count().await.unwrap(), 0);
        assert_eq!(
            h.api.requests(),
            vec![booking("first"), booking("second"), booking("third")]
        );

        let rejected = h.queue.list_rejected().await.unwrap();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].local_id, second);
    }

    #[tokio::test]
    async fn timed_out_write_is_delivered_after_reconnect() {
        let h = harness(true).await;
        let _auto = h.orchestrator.start(Handle::current());
        h.queue.enqueue(&booking("A")).await.unwrap();
        h.api.queue_reply(MockReply::Stall);

        let outcome = h.orchestrator.trigger_sync().await;
        assert_eq!(
            outcome,
            TriggerOutcome::Completed(SyncSummary {
                succeeded: 0,
                failed: 0,
                deferred: 1
            })
        );
        assert_eq!(h.orchestrator.pending_count().await.unwrap(), 1);

        h.connectivity.set_online(false);
        h.connectivity.set_online(true);

        let queue = Arc::clone(&h.queue);
        for _ in 0..100 {
            if queue.pending_count().await.unwrap() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(h.orchestrator.pending_count().await.unwrap(), 0);

        // Same payload both times
        assert_eq!(h.api.requests(), vec![booking("A"), booking("A")]);
    }

    #[tokio::test]
    async fn going_offline_does_not_trigger() {
        let h = harness(true).await;
        let _auto = h.orchestrator.start(Handle::current());
        h.queue.enqueue(&booking("A")).await.unwrap();

        h.connectivity.set_online(false);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(h.api.requests().is_empty());
    }

    #[tokio::test]
    async fn dropped_start_subscription_stops_auto_sync() {
        let h = harness(false).await;
        let auto = h.orchestrator.start(Handle::current());
        drop(auto);
        h.queue.enqueue(&booking("A")).await.unwrap();

        h.connectivity.set_online(true);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(h.api.requests().is_empty());
        assert_eq!(h.orchestrator.pending_count().await.unwrap(), 1);
    }

    // ===========================================
    // Submit
    // ===========================================

    #[tokio::test]
    async fn submit_online_delivers_directly() {
        let h = harness(true).await;

        let outcome = h.orchestrator.submit(booking("A")).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Delivered);
        assert_eq!(h.queue.pending_count().await.unwrap(), 0);
        assert_eq!(h.api.requests().len(), 1);
    }

    #[tokio::test]
    async fn submit_rejection_is_returned_not_queued() {
        let h = harness(true).await;
        h.api
            .queue_reply(MockReply::StatusWithBody(400, "invalid phone".into()));

        let outcome = h.orchestrator.submit(booking("A")).await.unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Rejected {
                reason: "HTTP 400: invalid phone".into()
            }
        );
        assert_eq!(h.queue.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn submit_offline_queues_without_calling_remote() {
        let h = harness(false).await;

        let local_id = match h.orchestrator.submit(booking("A")).await.unwrap() {
            SubmitOutcome::Queued(local_id) => local_id,
            other => panic!("Expected Queued, got {:?}", other),
        };
        assert!(h.queue.get(&local_id).await.unwrap().is_some());
        assert!(h.api.requests().is_empty());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.queue.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn submit_transient_failure_queues_and_follows_up() {
        let h = harness(true).await;
        h.api.queue_reply(MockReply::Status(503));

        let outcome = h.orchestrator.submit(booking("A")).await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Queued(_)));

        // The follow-up pass delivers it
        let queue = Arc::clone(&h.queue);
        for _ in 0..100 {
            if queue.pending_count().await.unwrap() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(h.queue.pending_count().await.unwrap(), 0);
        assert_eq!(h.api.requests().len(), 2);
    }
}
