//! Hand-off from the webhook normalizer to the save endpoint.
//!
//! The normalizer does not write to the store itself; it forwards the
//! normalized attributes to the save endpoint so both entry points share one
//! write path.

use crate::attributes::AttributeSet;
use crate::upsert::UpsertOutcome;
use async_trait::async_trait;

/// Errors forwarding a normalized event.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("Save endpoint unreachable: {message}")]
    Transport { message: String },

    #[error("Save endpoint rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Save endpoint returned an unreadable response: {message}")]
    InvalidResponse { message: String },
}

/// Delivers normalized attributes to the save operation.
#[async_trait]
pub trait SaveForwarder: Send + Sync {
    async fn forward(
        &self,
        attributes: &AttributeSet,
        update_existing: bool,
    ) -> Result<UpsertOutcome, ForwardError>;
}
