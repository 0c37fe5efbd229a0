//! Durable local queue of booking writes awaiting delivery.
//!
//! The queue is the only thing that must survive a restart: a write is
//! durable before [`QueueStore::enqueue`] returns, and stays pending until the
//! engine marks it resolved. Resolved records are kept as tombstones until
//! [`QueueStore::purge_resolved`] removes them.

mod sqlite;

pub use sqlite::SqliteQueue;

use crate::error::StorageError;
use async_trait::async_trait;
use lodge_sync_types::{LocalId, Payload, PendingWrite, Resolution};
use std::time::Duration;

/// Trait for queue storage backends.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Create tables and indexes if they don't exist. Idempotent.
    async fn initialize(&self) -> Result<(), StorageError>;

    /// Persist a new unresolved write and return its id.
    async fn enqueue(&self, payload: &Payload) -> Result<LocalId, StorageError>;

    /// All unresolved writes, oldest first.
    async fn list_pending(&self) -> Result<Vec<PendingWrite>, StorageError>;

    /// Resolve a pending write.
    ///
    /// Returns false (and changes nothing) if the id is unknown or the write
    /// was already resolved.
    async fn mark_resolved(
        &self,
        local_id: &LocalId,
        resolution: Resolution,
    ) -> Result<bool, StorageError>;

    /// Record a transient delivery failure against a pending write.
    async fn record_deferral(&self, local_id: &LocalId, reason: &str)
        -> Result<(), StorageError>;

    /// Remove a write whatever its state. Returns false if it did not exist.
    async fn discard(&self, local_id: &LocalId) -> Result<bool, StorageError>;

    /// Number of unresolved writes, always `list_pending().len()`.
    ///
    /// Unreadable records are not counted; they are only reachable
    /// through `discard`.
    async fn pending_count(&self) -> Result<u64, StorageError>;

    /// Look up one write by id.
    async fn get(&self, local_id: &LocalId) -> Result<Option<PendingWrite>, StorageError>;

    /// Writes the remote rejected that have not been purged yet, oldest
    /// resolution first.
    async fn list_rejected(&self) -> Result<Vec<PendingWrite>, StorageError>;

    /// Delete resolved writes whose resolution is at least `max_age` old.
    ///
    /// Returns the number of records removed.
    async fn purge_resolved(&self, max_age: Duration) -> Result<u64, StorageError>;
}
