// crates/checkout-capture-client/src/dispatch.rs
// ============================================================================
// Module: Capture Dispatch
// Description: Dispatcher trait and HTTP implementation for field captures.
// Purpose: Send debounced field values to the capture endpoint.
// Dependencies: async-trait, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! [`CaptureDispatcher`] is the seam between the debounce layer and the
//! network. The HTTP implementation posts the capture JSON body and treats
//! anything other than a `{"success": true}` envelope as a failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default end-to-end request timeout for one capture dispatch. A hung
/// endpoint must not pin debounce tasks forever.
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// SECTION: Types
// ============================================================================

/// One debounced field capture ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldCapture {
    /// Capture-scope token issued by the bootstrap endpoint.
    pub token: String,
    /// Anonymous session identifier for guests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Field name as rendered on the checkout form.
    pub field_name: String,
    /// Final field value after the quiet period.
    pub field_value: String,
}

/// Dispatch errors.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Transport-level failure.
    #[error("dispatch transport error: {0}")]
    Transport(String),
    /// Server rejected the capture.
    #[error("capture rejected: {0}")]
    Rejected(String),
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Dispatcher for debounced field captures.
#[async_trait]
pub trait CaptureDispatcher: Send + Sync {
    /// Sends one field capture.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the capture cannot be delivered or is
    /// rejected by the server.
    async fn dispatch(&self, capture: FieldCapture) -> Result<(), DispatchError>;
}

// ============================================================================
// SECTION: HTTP Dispatcher
// ============================================================================

/// Configuration for the HTTP capture dispatcher.
#[derive(Debug, Clone)]
pub struct HttpDispatcherConfig {
    /// Full URL of the field capture endpoint.
    pub endpoint: String,
    /// Optional authenticated user id forwarded as a header.
    pub user_id: Option<u64>,
    /// End-to-end request timeout.
    pub timeout: Duration,
}

impl HttpDispatcherConfig {
    /// Builds a dispatcher configuration with the default timeout.
    #[must_use]
    pub const fn new(endpoint: String, user_id: Option<u64>) -> Self {
        Self {
            endpoint,
            user_id,
            timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }
}

/// HTTP dispatcher posting captures to the capture server.
pub struct HttpCaptureDispatcher {
    /// Shared HTTP client.
    client: reqwest::Client,
    /// Dispatcher configuration.
    config: HttpDispatcherConfig,
}

impl HttpCaptureDispatcher {
    /// Builds an HTTP dispatcher with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Transport`] when the HTTP client cannot be
    /// constructed.
    pub fn new(config: HttpDispatcherConfig) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| DispatchError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            config,
        })
    }
}

#[async_trait]
impl CaptureDispatcher for HttpCaptureDispatcher {
    async fn dispatch(&self, capture: FieldCapture) -> Result<(), DispatchError> {
        let mut request = self.client.post(&self.config.endpoint).json(&capture);
        if let Some(user_id) = self.config.user_id {
            request = request.header("x-checkout-user-id", user_id);
        }
        let response = request
            .send()
            .await
            .map_err(|err| DispatchError::Transport(err.to_string()))?;
        let status = response.status();
        let envelope: Value = response
            .json()
            .await
            .map_err(|err| DispatchError::Transport(err.to_string()))?;
        if !status.is_success() || envelope["success"] != Value::Bool(true) {
            let message = envelope["data"].as_str().unwrap_or("unknown rejection").to_string();
            return Err(DispatchError::Rejected(message));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
