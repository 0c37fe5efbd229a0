//! # sync-core
//!
//! Pure logic for lodge-sync (no I/O, instant tests).
//!
//! This crate implements the decisions a reconciliation pass makes without
//! any network or disk I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects:
//! - [`outcome`] turns a remote response into accepted / rejected / deferred
//! - [`tally`] counts a pass and produces its progress snapshots
//! - [`trigger`] decides whether a sync request should start a pass
//!
//! The actual I/O (queue database, HTTP) is performed by `sync-client`,
//! which acts on the decisions made here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod outcome;
pub mod tally;
pub mod trigger;

pub use outcome::{DeliveryOutcome, StatusPolicy};
pub use tally::PassTally;
pub use trigger::{decide, TriggerDecision, TriggerReason};
