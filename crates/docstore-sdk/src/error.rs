//! Error types for document store operations.
//!
//! Every failure carries enough context to be logged server-side and, where it
//! makes sense, relayed to the caller verbatim.

use thiserror::Error;

/// Errors raised while talking to the document store API.
///
/// These errors represent failures when communicating with the store,
/// including HTTP errors, rate limiting, and parsing failures.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP error response that has no more specific variant.
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    /// The store rejected the request payload (400 / 422).
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// API key missing or rejected.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// The integration has no access to the requested database or page.
    #[error("Authorization failed")]
    AuthorizationFailed,

    /// The requested database or page does not exist.
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {message}")]
    RateLimited { message: String },

    /// Request to the store timed out.
    #[error("Request timeout")]
    Timeout,

    /// Client construction failed (bad base URL, TLS setup, ...).
    #[error("Client configuration error: {message}")]
    Configuration { message: String },

    /// Failed to parse a JSON response.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP client error (network, TLS, etc.).
    #[error("HTTP client error: {0}")]
    HttpClientError(#[source] reqwest::Error),
}

impl ApiError {
    /// Check if this error represents a transient condition that may succeed if retried.
    ///
    /// Transient conditions include:
    /// - Server errors (5xx)
    /// - Rate limiting (429)
    /// - Request timeouts
    /// - Network/transport errors
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpError { status, .. } => *status >= 500 || *status == 429,
            Self::RateLimited { .. } => true,
            Self::Timeout => true,
            Self::InvalidRequest { .. } => false,
            Self::AuthenticationFailed => false,
            Self::AuthorizationFailed => false,
            Self::NotFound { .. } => false,
            Self::Configuration { .. } => false,
            Self::JsonError(_) => false,
            Self::HttpClientError(_) => true,
        }
    }

    /// Map a non-success HTTP status and its body to an error.
    pub fn from_status(status: u16, body: String) -> Self {
        let message = extract_message(&body);
        match status {
            400 | 422 => Self::InvalidRequest { message },
            401 => Self::AuthenticationFailed,
            403 => Self::AuthorizationFailed,
            404 => Self::NotFound { message },
            429 => Self::RateLimited { message },
            _ => Self::HttpError { status, message },
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::HttpClientError(error)
        }
    }
}

/// Pull the human readable `message` field out of an error body, falling back
/// to the raw body text.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            if body.is_empty() {
                "no response body".to_string()
            } else {
                body.to_string()
            }
        })
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
