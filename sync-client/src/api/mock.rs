//! Mock booking API for testing.
//!
//! Replies are scripted per call and every submitted payload is captured.

use super::{ApiError, ApiResponse, BookingApi};
use async_trait::async_trait;
use lodge_sync_types::Payload;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;

/// Scripted reply for one `create_booking` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Respond with this status and an empty body.
    Status(u16),
    /// Respond with this status and body.
    StatusWithBody(u16, String),
    /// Fail with [`ApiError::Timeout`].
    Timeout,
    /// Fail with [`ApiError::Network`].
    NetworkError(String),
    /// Fail with [`ApiError::InvalidRequest`].
    InvalidRequest(String),
    /// Never respond.
    Stall,
}

/// Mock booking API.
///
/// Calls with no scripted reply left get `201 Created`. Clones share state.
#[derive(Debug)]
pub struct MockBookingApi {
    inner: Arc<Mutex<MockBookingApiInner>>,
}

#[derive(Debug)]
struct MockBookingApiInner {
    replies: VecDeque<MockReply>,
    requests: Vec<Payload>,
    calls_started: usize,
    reachable: bool,
    gate: Option<Arc<Semaphore>>,
}

impl Default for MockBookingApi {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockBookingApiInner {
                replies: VecDeque::new(),
                requests: Vec::new(),
                calls_started: 0,
                reachable: true,
                gate: None,
            })),
        }
    }
}

impl MockBookingApi {
    /// Create a new mock API that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, MockBookingApiInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a reply for the next unanswered call.
    pub fn queue_reply(&self, reply: MockReply) {
        self.inner().replies.push_back(reply);
    }

    /// Queue several replies in order.
    pub fn queue_replies(&self, replies: impl IntoIterator<Item = MockReply>) {
        self.inner().replies.extend(replies);
    }

    /// Payloads that reached the API (answered or not), in call order.
    pub fn requests(&self) -> Vec<Payload> {
        self.inner().requests.clone()
    }

    /// Number of `create_booking` calls made, including ones still waiting.
    pub fn calls_started(&self) -> usize {
        self.inner().calls_started
    }

    /// Set what `is_reachable` reports.
    pub fn set_reachable(&self, reachable: bool) {
        self.inner().reachable = reachable;
    }

    /// Make every subsequent call wait until [`release`](Self::release).
    pub fn hold(&self) {
        self.inner().gate = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let held calls (and all later ones) proceed.
    pub fn release(&self) {
        if let Some(gate) = self.inner().gate.take() {
            gate.close();
        }
    }
}

impl Clone for MockBookingApi {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl BookingApi for MockBookingApi {
    async fn create_booking(&self, payload: &Payload) -> Result<ApiResponse, ApiError> {
        let gate = {
            let mut inner = self.inner();
            inner.calls_started += 1;
            inner.gate.clone()
        };

        if let Some(gate) = gate {
            // Closed on release; acquire then fails immediately.
            let _ = gate.acquire().await;
        }

        let reply = {
            let mut inner = self.inner();
            inner.requests.push(payload.clone());
            inner.replies.pop_front()
        };

        match reply.unwrap_or(MockReply::Status(201)) {
            MockReply::Status(status) => Ok(ApiResponse::new(status, "")),
            MockReply::StatusWithBody(status, body) => Ok(ApiResponse::new(status, body)),
            MockReply::Timeout => Err(ApiError::Timeout),
            MockReply::NetworkError(message) => Err(ApiError::Network(message)),
            MockReply::InvalidRequest(message) => Err(ApiError::InvalidRequest(message)),
            MockReply::Stall => std::future::pending().await,
        }
    }

    async fn is_reachable(&self) -> bool {
        self.inner().reachable
    }
}
