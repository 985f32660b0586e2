// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the WhatsApp Business Cloud (Graph) API.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use bioline_config::model::WhatsAppConfig;
use bioline_core::BiolineError;

/// Graph API client shared by the outbound sender and the template catalog.
///
/// Every request carries the per-account bearer token and a bounded
/// timeout; nothing is retried.
#[derive(Debug, Clone)]
pub struct GraphClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    timeout: Duration,
}

impl GraphClient {
    pub fn new(config: &WhatsAppConfig) -> Result<Self, BiolineError> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BiolineError::Upstream {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.api_version, path)
    }

    /// `POST /{phone_number_id}/messages`; returns the platform's JSON response.
    pub async fn send_message(
        &self,
        phone_number_id: &str,
        access_token: &str,
        envelope: &Value,
    ) -> Result<Value, BiolineError> {
        let request = self
            .client
            .post(self.url(&format!("{phone_number_id}/messages")))
            .bearer_auth(access_token)
            .json(envelope);
        self.execute(request, "send_message").await
    }

    /// `GET /{waba_id}/message_templates`.
    pub async fn list_templates(
        &self,
        waba_id: &str,
        access_token: &str,
    ) -> Result<Value, BiolineError> {
        let request = self
            .client
            .get(self.url(&format!("{waba_id}/message_templates")))
            .bearer_auth(access_token);
        self.execute(request, "list_templates").await
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<Value, BiolineError> {
        let response = request.send().await.map_err(|e| self.transport_error(e, operation))?;

        let status = response.status();
        debug!(operation, status = %status, "graph API response received");

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e, operation))?;

        if !status.is_success() {
            // Raw platform text stays in server logs only.
            warn!(
                operation,
                status = %status,
                body = %String::from_utf8_lossy(&body),
                "graph API call failed"
            );
            return Err(BiolineError::Upstream {
                message: format!("messaging platform returned {}", status.as_u16()),
                status: Some(status.as_u16()),
                source: None,
            });
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|e| BiolineError::Upstream {
            message: format!("unparseable response from messaging platform: {e}"),
            status: Some(status.as_u16()),
            source: Some(Box::new(e)),
        })
    }

    fn transport_error(&self, e: reqwest::Error, operation: &'static str) -> BiolineError {
        if e.is_timeout() {
            warn!(operation, timeout = ?self.timeout, "graph API call timed out");
            return BiolineError::Timeout {
                duration: self.timeout,
            };
        }
        warn!(operation, error = %e, "graph API request failed");
        BiolineError::Upstream {
            message: "request to messaging platform failed".to_string(),
            status: None,
            source: Some(Box::new(e)),
        }
    }
}
