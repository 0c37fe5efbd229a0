//! # sync-types
//!
//! Record and progress types for the lodge-sync offline booking queue.
//!
//! This crate provides the foundational types used across all lodge-sync crates:
//! - [`LocalId`] - Locally generated identity of a queued write
//! - [`PendingWrite`], [`Payload`], [`Resolution`] - Queue records
//! - [`SyncProgress`], [`SyncSummary`] - Reconciliation pass reporting

#![warn(missing_docs)]
#![warn(clippy::all)]

mod ids;
mod progress;
mod record;

pub use ids::LocalId;
pub use progress::{SyncProgress, SyncSummary};
pub use record::{unix_millis, Payload, PendingWrite, Resolution};
