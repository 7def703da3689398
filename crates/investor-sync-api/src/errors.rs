//! Error types for the HTTP service

use crate::responses::ErrorResponse;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use investor_sync_core::{ForwardError, UpsertError, ValidationError};
use tracing::{error, warn};

/// Methods accepted on the write endpoints, advertised on 405 responses.
const ALLOWED_METHODS: &str = "POST, OPTIONS";

/// Request handler errors with HTTP status code mapping
///
/// - `400 Bad Request`: the body is unreadable or lacks a contact method.
///   Terminal; resubmitting the same body fails the same way.
/// - `405 Method Not Allowed`: anything other than POST or OPTIONS.
/// - `500 Internal Server Error`: the store or the save endpoint failed.
///   The underlying message is passed through to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ApiHandlerError {
    /// Maps to: `400 Bad Request`
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Body is not valid JSON or has the wrong shape
    ///
    /// Maps to: `400 Bad Request`
    #[error("Request body is not valid JSON: {message}")]
    MalformedBody { message: String },

    /// Maps to: `405 Method Not Allowed`
    #[error("Method {method} is not allowed")]
    MethodNotAllowed { method: String },

    /// Record create/update failed
    ///
    /// Maps to: `400` for validation failures, `500` otherwise
    #[error(transparent)]
    Upsert(#[from] UpsertError),

    /// Webhook could not be handed to the save endpoint
    ///
    /// Maps to: `500 Internal Server Error`
    #[error(transparent)]
    Forward(#[from] ForwardError),
}

impl ApiHandlerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MalformedBody { .. } => StatusCode::BAD_REQUEST,
            Self::Upsert(UpsertError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Upsert(_) | Self::Forward(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable label for the `error` field.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::Upsert(UpsertError::Validation(_)) => "validation_error",
            Self::MalformedBody { .. } => "invalid_json",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::Upsert(_) | Self::Forward(_) => "processing_error",
        }
    }

    /// Source chain below the top-level message, outermost first.
    fn details(&self) -> Option<String> {
        let mut chain = Vec::new();
        let mut source = std::error::Error::source(self);
        while let Some(e) = source {
            chain.push(e.to_string());
            source = e.source();
        }
        if chain.is_empty() {
            None
        } else {
            Some(chain.join(": "))
        }
    }

    /// Convert into a response, optionally exposing the error chain.
    pub fn into_reply(self, include_details: bool) -> ErrorReply {
        ErrorReply {
            error: self,
            include_details,
        }
    }
}

impl IntoResponse for ApiHandlerError {
    fn into_response(self) -> Response {
        self.into_reply(false).into_response()
    }
}

/// Handler error bound to the environment's detail policy.
#[derive(Debug)]
pub struct ErrorReply {
    error: ApiHandlerError,
    include_details: bool,
}

impl ErrorReply {
    pub fn error(&self) -> &ApiHandlerError {
        &self.error
    }
}

impl IntoResponse for ErrorReply {
    fn into_response(self) -> Response {
        let error = self.error;
        let status = error.status_code();

        // Full context stays server-side
        if status.is_server_error() {
            error!(
                error = %error,
                details = error.details().as_deref().unwrap_or(""),
                label = error.label(),
                "Request failed"
            );
        } else {
            warn!(error = %error, label = error.label(), "Request rejected");
        }

        let body = ErrorResponse {
            success: false,
            error: error.label().to_string(),
            message: error.to_string(),
            details: if self.include_details {
                error.details()
            } else {
                None
            },
        };

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::METHOD_NOT_ALLOWED {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        }

        response
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
