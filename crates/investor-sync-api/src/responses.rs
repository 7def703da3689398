//! Request and response bodies for the API.

use investor_sync_core::{AttributeSet, UpsertOutcome};
use serde::{Deserialize, Serialize};

// ============================================================================
// Request Types
// ============================================================================

/// Body of the save endpoint: an attribute set plus resolution hints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveRequest {
    /// Explicit record to update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,

    /// Look up an existing record by email/phone before creating
    #[serde(default)]
    pub update_existing: bool,

    #[serde(flatten)]
    pub attributes: AttributeSet,
}

// ============================================================================
// Response Types
// ============================================================================

/// Successful save or webhook response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,

    #[serde(flatten)]
    pub outcome: UpsertOutcome,

    /// Webhook event label, set only on the webhook endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

impl SaveResponse {
    pub fn new(outcome: UpsertOutcome) -> Self {
        Self {
            success: true,
            outcome,
            event: None,
        }
    }

    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }
}

/// Failure body shared by every endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,

    /// Machine-readable label, e.g. `validation_error`
    pub error: String,

    pub message: String,

    /// Error chain; present only in development
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}
