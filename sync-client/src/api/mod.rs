//! Remote booking API abstraction.
//!
//! The engine only needs one call ("create booking") and a cheap reachability
//! check. Implementations:
//! - [`HttpBookingApi`]: the real JSON-over-HTTP backend
//! - [`MockBookingApi`]: scripted replies for tests

mod http;
mod mock;

pub use http::HttpBookingApi;
pub use mock::{MockBookingApi, MockReply};

use async_trait::async_trait;
use lodge_sync_types::Payload;

/// Status and body of a completed create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, used only for diagnostics.
    pub body: String,
}

impl ApiResponse {
    /// Build a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// A create call that produced no status. Always treated as transient.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, reset, and similar.
    #[error("network error: {0}")]
    Network(String),

    /// No response within the request timeout.
    #[error("request timed out")]
    Timeout,

    /// The request could not be built (bad base URL, TLS setup).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Remote booking system.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Submit a booking creation request.
    ///
    /// Any HTTP status is `Ok`; classification is the caller's job.
    async fn create_booking(&self, payload: &Payload) -> Result<ApiResponse, ApiError>;

    /// Whether the remote answers at all.
    async fn is_reachable(&self) -> bool;
}
