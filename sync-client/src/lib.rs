//! # sync-client
//!
//! Offline-first write queue for booking creation.
//!
//! Bookings made while the remote is unreachable are stored in a local SQLite
//! queue and delivered later, exactly once each, in the order they were made.
//!
//! ## Components
//!
//! - **Queue**: durable store of pending writes ([`QueueStore`], [`SqliteQueue`])
//! - **Booking API**: the remote "create booking" call ([`BookingApi`], HTTP and mock)
//! - **Connectivity**: online/offline state with transition listeners
//! - **Engine**: one reconciliation pass over the pending set
//! - **Orchestrator**: when passes run, at most one at a time
//! - **Tasks**: reachability probe, periodic sync, tombstone purge
//!
//! ## Example
//!
//! ```ignore
//! use lodge_sync_client::{ConnectivityObserver, HttpBookingApi, SqliteQueue, SyncOrchestrator};
//!
//! let queue = Arc::new(SqliteQueue::open(&path).await?);
//! let api = Arc::new(HttpBookingApi::new(&config.remote)?);
//! let connectivity = Arc::new(ConnectivityObserver::new(api.is_reachable().await));
//! let orchestrator = Arc::new(SyncOrchestrator::new(queue, api, connectivity));
//!
//! let _auto = orchestrator.start(tokio::runtime::Handle::current());
//! let _progress = orchestrator.on_progress(|p| println!("{p}"));
//!
//! orchestrator.submit(payload).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod connectivity;
pub mod engine;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod queue;
pub mod tasks;

pub use api::{ApiError, ApiResponse, BookingApi, HttpBookingApi, MockBookingApi, MockReply};
pub use config::{Config, ConfigError, RemoteConfig, RetentionConfig, StorageConfig, SyncConfig};
pub use connectivity::ConnectivityObserver;
pub use engine::ReconciliationEngine;
pub use error::{StorageError, StorageResult};
pub use notify::{Registry, Subscription};
pub use orchestrator::{SubmitOutcome, SyncOrchestrator, TriggerOutcome};
pub use queue::{QueueStore, SqliteQueue};
pub use tasks::{spawn_periodic_sync, spawn_probe_task, spawn_purge_task};

pub use lodge_sync_core::{StatusPolicy, TriggerReason};
pub use lodge_sync_types::{LocalId, Payload, PendingWrite, Resolution, SyncProgress, SyncSummary};
