//! Reconciliation pass reporting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of one moment of a reconciliation pass.
///
/// Constructed once and handed to observers by reference; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SyncProgress {
    /// An item finished; `processed` of `total` are done.
    Running {
        /// Items handled so far in this pass.
        processed: u64,
        /// Items captured at pass start.
        total: u64,
    },
    /// The pass handled every captured item.
    Done {
        /// Items the remote accepted.
        succeeded: u64,
        /// Items the remote permanently rejected.
        failed: u64,
        /// Items left pending after a transient failure.
        deferred: u64,
        /// Items captured at pass start.
        total: u64,
    },
    /// The pass could not start.
    Error {
        /// Description of the failure.
        message: String,
    },
}

impl SyncProgress {
    /// True for `Done` and `Error`, the two final events of a pass.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SyncProgress::Running { .. })
    }
}

impl fmt::Display for SyncProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncProgress::Running { processed, total } => {
                write!(f, "syncing {processed} of {total}")
            }
            SyncProgress::Done {
                succeeded,
                failed,
                deferred,
                total,
            } => write!(
                f,
                "synced {succeeded} of {total} ({failed} rejected, {deferred} still pending)"
            ),
            SyncProgress::Error { message } => write!(f, "sync failed: {message}"),
        }
    }
}

/// Counts returned by a reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Items the remote accepted.
    pub succeeded: u64,
    /// Items the remote permanently rejected.
    pub failed: u64,
    /// Items left pending after a transient failure.
    pub deferred: u64,
}

impl SyncSummary {
    /// Items handled in the pass.
    pub fn total(&self) -> u64 {
        self.succeeded + self.failed + self.deferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_is_not_terminal() {
        assert!(!SyncProgress::Running {
            processed: 1,
            total: 2
        }
        .is_terminal());
        assert!(SyncProgress::Error {
            message: "x".into()
        }
        .is_terminal());
    }

    #[test]
    fn display_matches_status_indicator_wording() {
        let running = SyncProgress::Running {
            processed: 2,
            total: 5,
        };
        assert_eq!(running.to_string(), "syncing 2 of 5");

        let done = SyncProgress::Done {
            succeeded: 2,
            failed: 1,
            deferred: 0,
            total: 3,
        };
        assert_eq!(done.to_string(), "synced 2 of 3 (1 rejected, 0 still pending)");
    }

    #[test]
    fn progress_serializes_with_phase_tag() {
        let json = serde_json::to_value(SyncProgress::Running {
            processed: 1,
            total: 3,
        })
        .unwrap();
        assert_eq!(json["phase"], "running");
        assert_eq!(json["processed"], 1);
    }

    #[test]
    fn summary_total() {
        let summary = SyncSummary {
            succeeded: 2,
            failed: 1,
            deferred: 4,
        };
        assert_eq!(summary.total(), 7);
    }
}
