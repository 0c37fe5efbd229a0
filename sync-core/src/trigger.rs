//! Sync trigger decisions.
//!
//! Every request to reconcile comes with a [`TriggerReason`]. Whether it turns
//! into a pass depends on connectivity and, for automatic triggers, on there
//! being anything to deliver. The at-most-one-pass guard is not decided here;
//! it needs an atomic flag and lives in sync-client's orchestrator.

use std::fmt;

/// Why a sync was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Explicit user request ("Sync Now").
    Manual,
    /// Connectivity came back.
    Reconnected,
    /// Periodic timer fired.
    Timer,
    /// Application start.
    Startup,
    /// A write was just queued while online.
    AfterEnqueue,
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriggerReason::Manual => "manual",
            TriggerReason::Reconnected => "reconnected",
            TriggerReason::Timer => "timer",
            TriggerReason::Startup => "startup",
            TriggerReason::AfterEnqueue => "after-enqueue",
        };
        f.write_str(name)
    }
}

/// Result of [`decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// Start a pass.
    Run,
    /// Offline; a pass would only defer every item.
    SkipOffline,
    /// Nothing pending; an automatic pass would be empty.
    SkipEmpty,
}

/// Decide whether a sync request should start a pass.
///
/// `pending` is `None` when the caller did not count the queue (manual
/// triggers run regardless of count, so they never need to).
pub fn decide(reason: TriggerReason, online: bool, pending: Option<u64>) -> TriggerDecision {
    if !online {
        return TriggerDecision::SkipOffline;
    }
    match (reason, pending) {
        (TriggerReason::Manual, _) => TriggerDecision::Run,
        (_, Some(0)) => TriggerDecision::SkipEmpty,
        _ => TriggerDecision::Run,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTOMATIC: [TriggerReason; 4] = [
        TriggerReason::Reconnected,
        TriggerReason::Timer,
        TriggerReason::Startup,
        TriggerReason::AfterEnqueue,
    ];

    #[test]
    fn offline_never_runs() {
        assert_eq!(
            decide(TriggerReason::Manual, false, Some(5)),
            TriggerDecision::SkipOffline
        );
        for reason in AUTOMATIC {
            assert_eq!(decide(reason, false, Some(5)), TriggerDecision::SkipOffline);
        }
    }

    #[test]
    fn manual_runs_even_when_empty() {
        assert_eq!(
            decide(TriggerReason::Manual, true, Some(0)),
            TriggerDecision::Run
        );
        assert_eq!(decide(TriggerReason::Manual, true, None), TriggerDecision::Run);
    }

    #[test]
    fn automatic_skips_empty_queue() {
        for reason in AUTOMATIC {
            assert_eq!(decide(reason, true, Some(0)), TriggerDecision::SkipEmpty);
        }
    }

    #[test]
    fn automatic_runs_with_pending_work() {
        for reason in AUTOMATIC {
            assert_eq!(decide(reason, true, Some(3)), TriggerDecision::Run);
        }
    }

    #[test]
    fn reason_display() {
        assert_eq!(TriggerReason::AfterEnqueue.to_string(), "after-enqueue");
        assert_eq!(TriggerReason::Reconnected.to_string(), "reconnected");
    }
}
