//! # Investor Sync Core
//!
//! Domain logic for turning deal-platform webhooks and form submissions into
//! investor records in the document store.
//!
//! ## Architecture
//!
//! - [`normalizer`] folds a webhook body into a flat [`AttributeSet`]
//! - [`properties`] maps attribute keys to typed store properties through a
//!   declarative table
//! - [`upsert`] resolves the target record (explicit id, identity lookup, or
//!   none) and issues the create or update call
//! - [`adapters`] binds the [`upsert::RecordStore`] seam to `docstore-sdk`
//!
//! Store access only happens behind the `RecordStore` trait so the resolution
//! logic can be exercised without a network.
//!
//! ## Usage
//!
//! ```rust
//! use investor_sync_core::normalizer::{normalize, WebhookPayload};
//!
//! let payload: WebhookPayload = serde_json::from_str(
//!     r#"{"event":"investor.funded","investor":{"email":"ada@example.com"}}"#,
//! ).unwrap();
//! let normalized = normalize(&payload).unwrap();
//! assert_eq!(normalized.attributes.text("investor_state").as_deref(), Some("funded"));
//! ```

pub mod adapters;
pub mod attributes;
pub mod forwarding;
pub mod normalizer;
pub mod properties;
pub mod upsert;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use attributes::{AttributeSet, AttributeValue};
pub use forwarding::{ForwardError, SaveForwarder};
pub use normalizer::{normalize, DealEvent, NormalizedEvent, WebhookPayload};
pub use upsert::{
    MatchField, MatchResult, RecordStore, RecordUpserter, StoreError, StoredRecord, UpsertAction,
    UpsertError, UpsertOutcome, UpsertRequest,
};

/// Opaque identifier assigned to a record by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Create a record identifier, rejecting blank values and values that
    /// could act as URL structure (`/`, `\`, `?`, `#`, `%`).
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Required {
                field: "record_id".to_string(),
            });
        }
        if let Some(c) = trimmed
            .chars()
            .find(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_control())
        {
            return Err(ValidationError::InvalidFormat {
                field: "record_id".to_string(),
                message: format!("must not contain {:?}", c),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RecordId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

/// Input validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Either an email address or a phone number is required")]
    MissingContactMethod,

    #[error("Field '{field}' is required")]
    Required { field: String },

    #[error("Field '{field}' has invalid format: {message}")]
    InvalidFormat { field: String, message: String },
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
