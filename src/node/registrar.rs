//! Node registration client
//!
//! Registration and heartbeats are the same call: a JSON POST of the
//! wallet address, a fresh device snapshot and the send time to
//! `/api/nodes/link`. Any 2xx response is an acceptance.

use crate::config::SessionConfig;
use crate::device::DeviceSnapshot;
use crate::error::SessionError;
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use url::Url;

/// Request body of the node link endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest<'a> {
    pub wallet_address: &'a str,
    pub device_info: &'a DeviceSnapshot,
    pub timestamp: u64,
}

/// Accepted registration; the body is opaque and only logged
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationReceipt {
    pub status: u16,
    pub body: Option<Value>,
}

/// Sends registration / heartbeat payloads to the backend
#[trait_variant::make(NodeRegistrar: Send)]
pub trait LocalNodeRegistrar {
    async fn register(
        &self,
        address: &str,
        device: &DeviceSnapshot,
        timestamp: u64,
    ) -> Result<RegistrationReceipt, SessionError>;
}

/// HTTP implementation of the registrar
pub struct HttpNodeRegistrar {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpNodeRegistrar {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self { endpoint, client })
    }

    /// Create a registrar for the endpoint named in the config
    pub fn from_config(config: &SessionConfig) -> Result<Self, String> {
        Self::new(config.registration_url()?, config.request_timeout())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl NodeRegistrar for HttpNodeRegistrar {
    async fn register(
        &self,
        address: &str,
        device: &DeviceSnapshot,
        timestamp: u64,
    ) -> Result<RegistrationReceipt, SessionError> {
        let request = RegistrationRequest {
            wallet_address: address,
            device_info: device,
            timestamp,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| SessionError::registration(None, format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::registration(
                Some(status.as_u16()),
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            ));
        }

        // The node is linked once the status is OK; the body is informational
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                log::debug!("Failed to read node link response: {}", e);
                String::new()
            }
        };
        let body = if text.trim().is_empty() {
            None
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => Some(value),
                Err(e) => {
                    log::debug!("Node link response is not JSON: {}", e);
                    None
                }
            }
        };

        Ok(RegistrationReceipt {
            status: status.as_u16(),
            body,
        })
    }
}

/// Milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
