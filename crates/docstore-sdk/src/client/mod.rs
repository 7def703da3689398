//! Document store API client.
//!
//! This module provides the `DocStoreClient` for making authenticated calls to
//! the store's REST API. A single client is built per process and shared; the
//! underlying `reqwest::Client` pools connections across requests.

mod pages;
mod query;

use std::fmt;
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;

pub use pages::{CreatePageRequest, Page, Parent, UpdatePageRequest};
pub use query::{Filter, QueryRequest, QueryResponse};

/// Default API version header value.
pub const DEFAULT_API_VERSION: &str = "2022-06-28";

/// Configuration for document store client behavior.
///
/// # Examples
///
/// ```
/// use docstore_sdk::client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(10))
///     .with_api_url("http://localhost:9000");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string for API requests
    pub user_agent: String,
    /// Request timeout duration
    pub timeout: Duration,
    /// Store API base URL (no trailing slash)
    pub api_url: String,
    /// Value sent in the API version header
    pub api_version: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("docstore-sdk/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
            api_url: "https://api.notion.com".to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl ClientConfig {
    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the API base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the API version header value.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }
}

/// Authenticated client for the document store.
#[derive(Clone)]
pub struct DocStoreClient {
    api_key: String,
    http_client: reqwest::Client,
    base_url: url::Url,
    config: ClientConfig,
}

impl fmt::Debug for DocStoreClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocStoreClient")
            .field("api_key", &"<REDACTED>")
            .field("config", &self.config)
            .finish()
    }
}

impl DocStoreClient {
    /// Create a new builder for constructing a client.
    pub fn builder(api_key: impl Into<String>) -> DocStoreClientBuilder {
        DocStoreClientBuilder::new(api_key)
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build an endpoint URL from path segments.
    ///
    /// Each segment is percent-encoded, including `/`, so caller-supplied ids
    /// can never address a different endpoint.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<url::Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Configuration {
                message: format!("API URL '{}' cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a JSON request and decode a JSON response.
    ///
    /// Non-success statuses are mapped through [`ApiError::from_status`] with
    /// the response body as the message.
    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        debug!(method = %method, url = %url, "Sending document store request");

        let response = self
            .http_client
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header("Notion-Version", &self.config.api_version)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            return Err(ApiError::from_status(status.as_u16(), body));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Builder for constructing `DocStoreClient` instances.
#[derive(Debug)]
pub struct DocStoreClientBuilder {
    api_key: String,
    config: Option<ClientConfig>,
}

impl DocStoreClientBuilder {
    fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            config: None,
        }
    }

    /// Set the client configuration.
    ///
    /// If not set, uses `ClientConfig::default()`.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Configuration` if the API key is empty, the base URL
    /// does not parse, or the HTTP client cannot be created.
    pub fn build(self) -> Result<DocStoreClient, ApiError> {
        let config = self.config.unwrap_or_default();

        if self.api_key.trim().is_empty() {
            return Err(ApiError::Configuration {
                message: "API key must not be empty".to_string(),
            });
        }

        let base_url = url::Url::parse(&config.api_url).map_err(|e| ApiError::Configuration {
            message: format!("Invalid API URL '{}': {}", config.api_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Configuration {
                message: format!("API URL '{}' cannot carry a path", config.api_url),
            });
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ApiError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(DocStoreClient {
            api_key: self.api_key,
            http_client,
            base_url,
            config,
        })
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
