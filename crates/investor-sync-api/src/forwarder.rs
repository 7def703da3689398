//! HTTP forwarder from the webhook endpoint to the save endpoint.

use crate::config::ForwardingConfig;
use crate::errors::ConfigError;
use crate::responses::{ErrorResponse, SaveRequest, SaveResponse};
use async_trait::async_trait;
use investor_sync_core::{AttributeSet, ForwardError, SaveForwarder, UpsertOutcome};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// [`SaveForwarder`] that POSTs to the save endpoint.
#[derive(Debug, Clone)]
pub struct HttpSaveForwarder {
    client: reqwest::Client,
    save_url: reqwest::Url,
}

impl HttpSaveForwarder {
    pub fn new(config: &ForwardingConfig) -> Result<Self, ConfigError> {
        let save_url = reqwest::Url::parse(&config.save_url).map_err(|e| ConfigError::Invalid {
            message: format!("forwarding.save_url '{}': {}", config.save_url, e),
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("investor-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::Invalid {
                message: format!("failed to build forwarding client: {}", e),
            })?;

        Ok(Self { client, save_url })
    }

    pub fn save_url(&self) -> &str {
        self.save_url.as_str()
    }
}

#[async_trait]
impl SaveForwarder for HttpSaveForwarder {
    #[instrument(skip(self, attributes), fields(save_url = %self.save_url, attribute_count = attributes.len()))]
    async fn forward(
        &self,
        attributes: &AttributeSet,
        update_existing: bool,
    ) -> Result<UpsertOutcome, ForwardError> {
        let body = SaveRequest {
            record_id: None,
            update_existing,
            attributes: attributes.clone(),
        };

        let response = self
            .client
            .post(self.save_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Save endpoint request failed");
                ForwardError::Transport {
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ForwardError::Transport {
                message: e.to_string(),
            })?;

        if !status.is_success() {
            // Prefer the upserter's own message when the body is ours
            let message = serde_json::from_slice::<ErrorResponse>(&bytes)
                .map(|e| e.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).trim().to_string());
            warn!(status = status.as_u16(), message = %message, "Save endpoint rejected request");
            return Err(ForwardError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let saved: SaveResponse =
            serde_json::from_slice(&bytes).map_err(|e| ForwardError::InvalidResponse {
                message: e.to_string(),
            })?;

        debug!(
            action = %saved.outcome.action,
            record_id = %saved.outcome.record_id,
            "Save endpoint accepted forwarded attributes"
        );

        Ok(saved.outcome)
    }
}

#[cfg(test)]
#[path = "forwarder_tests.rs"]
mod tests;
