//! HTTP booking API backend.

use super::{ApiError, ApiResponse, BookingApi};
use crate::config::RemoteConfig;
use async_trait::async_trait;
use lodge_sync_types::Payload;
use std::time::Duration;

/// Booking API over JSON/HTTP.
///
/// `create_booking` POSTs the payload as a JSON object to the create
/// endpoint. `is_reachable` succeeds on any HTTP response from the base URL.
#[derive(Debug, Clone)]
pub struct HttpBookingApi {
    client: reqwest::Client,
    base_url: String,
    create_url: String,
    probe_timeout: Duration,
}

impl HttpBookingApi {
    /// Build a client from remote configuration.
    pub fn new(config: &RemoteConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.probe_timeout())
            .build()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            create_url: config.create_url(),
            probe_timeout: config.probe_timeout(),
        })
    }

    /// The create endpoint URL.
    pub fn create_url(&self) -> &str {
        &self.create_url
    }
}

fn map_send_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else if e.is_builder() {
        ApiError::InvalidRequest(e.to_string())
    } else {
        ApiError::Network(e.to_string())
    }
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn create_booking(&self, payload: &Payload) -> Result<ApiResponse, ApiError> {
        let response = self
            .client
            .post(&self.create_url)
            .json(payload)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status().as_u16();
        // The body is diagnostic only; losing it does not change the outcome.
        let body = response.text().await.unwrap_or_default();

        tracing::debug!(status, "Create booking responded");
        Ok(ApiResponse { status, body })
    }

    async fn is_reachable(&self) -> bool {
        match self
            .client
            .get(&self.base_url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::trace!("Reachability probe failed: {}", e);
                false
            }
        }
    }
}
