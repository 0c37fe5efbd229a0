//! Delivery outcome classification.
//!
//! The remote "create booking" call is judged only by its status:
//! - 2xx: accepted
//! - 4xx: permanently rejected (the data is invalid and will never succeed)
//! - anything else, plus network failures and timeouts: transient
//!
//! A few 4xx statuses describe the request's timing rather than its content
//! (`408 Request Timeout`, `429 Too Many Requests`). [`StatusPolicy`] treats
//! those as transient by default; the list is configurable.

use serde::Deserialize;

/// Longest response excerpt kept in a rejection or deferral reason.
pub const MAX_REASON_BODY: usize = 200;

/// What happened to one queued item in one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The remote accepted the write.
    Accepted,
    /// The remote refused the write; retrying it unchanged cannot succeed.
    Rejected {
        /// Status code and response excerpt.
        reason: String,
    },
    /// Delivery failed for a reason expected to clear up; try again next pass.
    Deferred {
        /// Description of the failure.
        reason: String,
    },
}

impl DeliveryOutcome {
    /// Outcome for a request that never produced a status (network error, timeout).
    pub fn transport_failure(reason: impl Into<String>) -> Self {
        DeliveryOutcome::Deferred {
            reason: reason.into(),
        }
    }

    /// True if the item leaves the pending set.
    pub fn resolves(&self) -> bool {
        !matches!(self, DeliveryOutcome::Deferred { .. })
    }
}

/// Maps HTTP statuses to outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusPolicy {
    /// 4xx statuses that are retried instead of rejected (default: 408, 429).
    #[serde(default = "default_transient_client_statuses")]
    pub transient_client_statuses: Vec<u16>,
}

fn default_transient_client_statuses() -> Vec<u16> {
    vec![408, 429]
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            transient_client_statuses: default_transient_client_statuses(),
        }
    }
}

impl StatusPolicy {
    /// Classify a response status. `body` is only used to explain the outcome.
    pub fn classify(&self, status: u16, body: &str) -> DeliveryOutcome {
        match status {
            200..=299 => DeliveryOutcome::Accepted,
            400..=499 if !self.transient_client_statuses.contains(&status) => {
                DeliveryOutcome::Rejected {
                    reason: describe(status, body),
                }
            }
            _ => DeliveryOutcome::Deferred {
                reason: describe(status, body),
            },
        }
    }
}

fn describe(status: u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {status}");
    }
    let excerpt: String = body.chars().take(MAX_REASON_BODY).collect();
    if excerpt.len() < body.len() {
        format!("HTTP {status}: {excerpt}...")
    } else {
        format!("HTTP {status}: {excerpt}")
    }
}
