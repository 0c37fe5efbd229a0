//! Reconciliation pass.
//!
//! One pass captures the pending set, then delivers each item once, oldest
//! first, and settles it:
//! - accepted: marked resolved
//! - rejected (4xx): marked resolved with the reason, and never retried
//! - deferred (timeout, network, 5xx): left pending with the attempt recorded
//!
//! A failing item never aborts the pass. Items enqueued after the capture
//! wait for the next pass.

use crate::api::{ApiError, BookingApi};
use crate::error::StorageError;
use crate::notify::Registry;
use crate::queue::QueueStore;
use lodge_sync_core::{DeliveryOutcome, PassTally, StatusPolicy};
use lodge_sync_types::{Payload, PendingWrite, Resolution, SyncProgress, SyncSummary};
use std::sync::Arc;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Delivers queued writes to the remote booking API.
pub struct ReconciliationEngine<Q, A> {
    queue: Arc<Q>,
    api: Arc<A>,
    policy: StatusPolicy,
    request_timeout: Duration,
    progress: Registry<SyncProgress>,
}

impl<Q: QueueStore, A: BookingApi> ReconciliationEngine<Q, A> {
    /// Create an engine with the default status policy and timeout.
    pub fn new(queue: Arc<Q>, api: Arc<A>, progress: Registry<SyncProgress>) -> Self {
        Self {
            queue,
            api,
            policy: StatusPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            progress,
        }
    }

    /// Use a different status policy.
    pub fn with_policy(mut self, policy: StatusPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use a different per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Run one pass over everything pending now.
    ///
    /// Emits `Running` after each item and `Done` at the end. If the pending
    /// set cannot be read, emits `Error` and returns the storage error.
    pub async fn run(&self) -> Result<SyncSummary, StorageError> {
        let items = match self.queue.list_pending().await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!("Cannot read offline queue: {}", e);
                self.progress.emit(&SyncProgress::Error {
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        let mut tally = PassTally::new(items.len() as u64);
        tracing::info!(total = tally.total(), "Reconciliation pass started");

        for item in &items {
            let outcome = self.attempt(&item.payload).await;
            self.settle(item, &outcome).await;
            let progress = tally.record(&outcome);
            self.progress.emit(&progress);
        }

        let (summary, done) = tally.finish();
        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            deferred = summary.deferred,
            "Reconciliation pass finished"
        );
        self.progress.emit(&done);
        Ok(summary)
    }

    /// Make one delivery attempt and classify it.
    pub(crate) async fn attempt(&self, payload: &Payload) -> DeliveryOutcome {
        match tokio::time::timeout(self.request_timeout, self.api.create_booking(payload)).await {
            Err(_) => DeliveryOutcome::transport_failure(format!(
                "no response within {}s",
                self.request_timeout.as_secs_f32()
            )),
            Ok(Err(e)) => {
                if let ApiError::InvalidRequest(_) = &e {
                    // Retrying will not help until the remote settings are fixed.
                    tracing::error!(
                        "Booking request could not be sent, check remote.base_url: {}",
                        e
                    );
                }
                DeliveryOutcome::transport_failure(e.to_string())
            }
            Ok(Ok(response)) => self.policy.classify(response.status, &response.body),
        }
    }

    async fn settle(&self, item: &PendingWrite, outcome: &DeliveryOutcome) {
        let local_id = &item.local_id;
        match outcome {
            DeliveryOutcome::Accepted => {
                tracing::debug!(local_id = %local_id, "Booking accepted");
                if let Err(e) = self.queue.mark_resolved(local_id, Resolution::Accepted).await {
                    // Delivered but still pending locally: it will be sent again.
                    tracing::warn!(
                        local_id = %local_id,
                        "Booking accepted but could not be marked resolved: {}",
                        e
                    );
                }
            }
            DeliveryOutcome::Rejected { reason } => {
                tracing::warn!(local_id = %local_id, reason = %reason, "Booking rejected by remote");
                let resolution = Resolution::Rejected {
                    reason: reason.clone(),
                };
                if let Err(e) = self.queue.mark_resolved(local_id, resolution).await {
                    tracing::warn!(
                        local_id = %local_id,
                        "Rejected booking could not be marked resolved: {}",
                        e
                    );
                }
            }
            DeliveryOutcome::Deferred { reason } => {
                tracing::debug!(
                    local_id = %local_id,
                    attempts = item.attempts + 1,
                    "Delivery deferred: {}",
                    reason
                );
                if let Err(e) = self.queue.record_deferral(local_id, reason).await {
                    tracing::warn!(local_id = %local_id, "Could not record deferral: {}", e);
                }
            }
        }
    }
}
