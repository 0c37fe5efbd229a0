//! Queue records.

use crate::LocalId;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Field name → value mapping sent verbatim to the remote "create booking" call.
///
/// The queue never inspects or validates payload contents.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// How a queued write left the pending set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// The remote accepted the write.
    Accepted,
    /// The remote refused the write as invalid; retrying it unchanged cannot succeed.
    Rejected {
        /// Human-readable reason (status and response excerpt).
        reason: String,
    },
}

impl Resolution {
    /// Storage tag for this resolution.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Accepted => "accepted",
            Resolution::Rejected { .. } => "rejected",
        }
    }

    /// Rejection reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Resolution::Accepted => None,
            Resolution::Rejected { reason } => Some(reason),
        }
    }
}

/// A queued creation request not yet confirmed by the remote.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingWrite {
    /// Identity within the local store. Never reused.
    pub local_id: LocalId,
    /// Fields for the remote create call.
    pub payload: Payload,
    /// Unix milliseconds at enqueue; non-decreasing within a store.
    pub enqueued_at: u64,
    /// False while pending; flips to true once and never back.
    pub resolved: bool,
    /// Transient delivery failures recorded so far.
    pub attempts: u32,
    /// Last transient failure, for diagnostics.
    pub last_error: Option<String>,
    /// Set together with `resolved`.
    pub resolution: Option<Resolution>,
    /// Unix milliseconds at resolution.
    pub resolved_at: Option<u64>,
}

impl PendingWrite {
    /// A fresh, unresolved record.
    pub fn new(local_id: LocalId, payload: Payload, enqueued_at: u64) -> Self {
        Self {
            local_id,
            payload,
            enqueued_at,
            resolved: false,
            attempts: 0,
            last_error: None,
            resolution: None,
            resolved_at: None,
        }
    }
}

// Payloads carry guest names and phone numbers; keep them out of logs.
impl std::fmt::Debug for PendingWrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingWrite")
            .field("local_id", &self.local_id)
            .field("payload", &format!("[{} fields REDACTED]", self.payload.len()))
            .field("enqueued_at", &self.enqueued_at)
            .field("resolved", &self.resolved)
            .field("attempts", &self.attempts)
            .field("last_error", &self.last_error)
            .field("resolution", &self.resolution)
            .field("resolved_at", &self.resolved_at)
            .finish()
    }
}

/// Current wall-clock time in unix milliseconds (0 if the clock is before 1970).
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
