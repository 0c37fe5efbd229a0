//! Pass accounting.
//!
//! A [`PassTally`] is created with the number of items captured at pass start,
//! fed one [`DeliveryOutcome`] per item, and produces the progress snapshot to
//! emit after each item plus the final summary.

use crate::DeliveryOutcome;
use lodge_sync_types::{SyncProgress, SyncSummary};

/// Counters for one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassTally {
    total: u64,
    processed: u64,
    summary: SyncSummary,
}

impl PassTally {
    /// Start counting a pass over `total` captured items.
    pub fn new(total: u64) -> Self {
        Self {
            total,
            processed: 0,
            summary: SyncSummary::default(),
        }
    }

    /// Record one item's outcome and return the `Running` snapshot for it.
    pub fn record(&mut self, outcome: &DeliveryOutcome) -> SyncProgress {
        match outcome {
            DeliveryOutcome::Accepted => self.summary.succeeded += 1,
            DeliveryOutcome::Rejected { .. } => self.summary.failed += 1,
            DeliveryOutcome::Deferred { .. } => self.summary.deferred += 1,
        }
        self.processed += 1;
        SyncProgress::Running {
            processed: self.processed,
            total: self.total,
        }
    }

    /// Items recorded so far.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Items captured at pass start.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Close the pass: the summary and its `Done` snapshot.
    pub fn finish(self) -> (SyncSummary, SyncProgress) {
        let done = SyncProgress::Done {
            succeeded: self.summary.succeeded,
            failed: self.summary.failed,
            deferred: self.summary.deferred,
            total: self.total,
        };
        (self.summary, done)
    }
}
