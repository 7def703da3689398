//! # Record Upserter
//!
//! Resolves which record an attribute set belongs to and writes it.
//!
//! Resolution order:
//! 1. An explicit record id is used as-is; no lookup.
//! 2. Otherwise, with `update_existing` set, the store is queried for a record
//!    whose email or phone equals the supplied values. The first hit wins.
//!    A failed lookup is logged and treated as no match.
//! 3. Otherwise a new record is created.
//!
//! Lookup-then-write is not atomic: two concurrent requests for the same new
//! contact can both miss the lookup and create two records.

use crate::attributes::AttributeSet;
use crate::properties::{build_properties, MappingContext, EMAIL_PROPERTY, PHONE_PROPERTY};
use crate::{RecordId, ValidationError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docstore_sdk::{ApiError, Filter, PropertyMap};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

// ============================================================================
// Store seam
// ============================================================================

/// Record as seen by the upserter: its id plus the identity fields used to
/// explain a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: RecordId,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Errors from the record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Store returned an unusable response: {message}")]
    InvalidResponse { message: String },
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api(e) => e.is_transient(),
            Self::InvalidResponse { .. } => false,
        }
    }
}

/// Operations the upserter needs from the document store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Return up to `limit` records matching `filter`, in store order.
    async fn query_records(
        &self,
        filter: &Filter,
        limit: u32,
    ) -> Result<Vec<StoredRecord>, StoreError>;

    /// Create a record in the configured collection.
    async fn create_record(&self, properties: &PropertyMap) -> Result<StoredRecord, StoreError>;

    /// Update properties on an existing record.
    async fn update_record(
        &self,
        record_id: &RecordId,
        properties: &PropertyMap,
    ) -> Result<StoredRecord, StoreError>;
}

// ============================================================================
// Request / outcome types
// ============================================================================

/// Input to [`RecordUpserter::upsert`].
#[derive(Debug, Clone, Default)]
pub struct UpsertRequest {
    pub attributes: AttributeSet,
    /// Explicit update target; skips lookup
    pub record_id: Option<RecordId>,
    /// Look for an existing record by email/phone before creating
    pub update_existing: bool,
}

/// Identity field that produced a lookup match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    Email,
    Phone,
}

impl fmt::Display for MatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => write!(f, "email"),
            Self::Phone => write!(f, "phone"),
        }
    }
}

/// Outcome of an identity lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    NoMatch,
    Matched {
        record_id: RecordId,
        matched_by: MatchField,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertAction {
    Created,
    Updated,
}

impl fmt::Display for UpsertAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
        }
    }
}

/// Result of a successful upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertOutcome {
    pub action: UpsertAction,
    pub record_id: RecordId,
    /// Set only for updates whose target came from a lookup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_by: Option<MatchField>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpsertError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to create record: {0}")]
    CreateFailed(#[source] StoreError),

    #[error("Failed to update record {record_id}: {source}")]
    UpdateFailed {
        record_id: RecordId,
        #[source]
        source: StoreError,
    },
}

// ============================================================================
// Upserter
// ============================================================================

/// Resolved write target.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Existing {
        record_id: RecordId,
        matched_by: Option<MatchField>,
    },
    New,
}

/// Creates or updates records in the document store.
#[derive(Clone)]
pub struct RecordUpserter {
    store: Arc<dyn RecordStore>,
    group_record_id: String,
}

impl RecordUpserter {
    /// Create an upserter.
    ///
    /// `group_record_id` is the record every upserted record is related to.
    pub fn new(store: Arc<dyn RecordStore>, group_record_id: impl Into<String>) -> Self {
        Self {
            store,
            group_record_id: group_record_id.into(),
        }
    }

    /// Upsert with the current time as the timestamp source.
    pub async fn upsert(&self, request: UpsertRequest) -> Result<UpsertOutcome, UpsertError> {
        self.upsert_at(request, Utc::now()).await
    }

    /// Upsert using `now` for the created/last-updated stamps.
    #[instrument(skip(self, request, now), fields(
        explicit_target = request.record_id.is_some(),
        update_existing = request.update_existing,
    ))]
    pub async fn upsert_at(
        &self,
        request: UpsertRequest,
        now: DateTime<Utc>,
    ) -> Result<UpsertOutcome, UpsertError> {
        if !request.attributes.has_contact_method() {
            return Err(ValidationError::MissingContactMethod.into());
        }

        let target = match request.record_id {
            Some(record_id) => Target::Existing {
                record_id,
                matched_by: None,
            },
            None if request.update_existing => match self.find_existing(&request.attributes).await {
                MatchResult::Matched {
                    record_id,
                    matched_by,
                } => Target::Existing {
                    record_id,
                    matched_by: Some(matched_by),
                },
                MatchResult::NoMatch => Target::New,
            },
            None => Target::New,
        };

        let context = MappingContext {
            group_record_id: &self.group_record_id,
            is_new_record: target == Target::New,
            now,
        };
        let properties = build_properties(&request.attributes, &context);

        match target {
            Target::Existing {
                record_id,
                matched_by,
            } => {
                let record = self
                    .store
                    .update_record(&record_id, &properties)
                    .await
                    .map_err(|source| {
                        warn!(record_id = %record_id, error = %source, "Record update failed");
                        UpsertError::UpdateFailed {
                            record_id: record_id.clone(),
                            source,
                        }
                    })?;

                info!(
                    record_id = %record.id,
                    matched_by = ?matched_by,
                    property_count = properties.len(),
                    "Updated record"
                );

                Ok(UpsertOutcome {
                    action: UpsertAction::Updated,
                    record_id: record.id,
                    matched_by,
                })
            }
            Target::New => {
                let record = self.store.create_record(&properties).await.map_err(|e| {
                    warn!(error = %e, "Record creation failed");
                    UpsertError::CreateFailed(e)
                })?;

                info!(
                    record_id = %record.id,
                    property_count = properties.len(),
                    "Created record"
                );

                Ok(UpsertOutcome {
                    action: UpsertAction::Created,
                    record_id: record.id,
                    matched_by: None,
                })
            }
        }
    }

    /// Look up an existing record by the set's email and/or phone.
    ///
    /// Store failures are logged and reported as [`MatchResult::NoMatch`].
    pub async fn find_existing(&self, attributes: &AttributeSet) -> MatchResult {
        let email = attributes.email();
        let phone = attributes.phone();

        let Some(filter) = identity_filter(email.as_deref(), phone.as_deref()) else {
            return MatchResult::NoMatch;
        };

        match self.store.query_records(&filter, 1).await {
            Ok(records) => match records.into_iter().next() {
                Some(record) => {
                    let matched_by = match_field(&record, email.as_deref(), phone.as_deref());
                    info!(record_id = %record.id, matched_by = %matched_by, "Found existing record");
                    MatchResult::Matched {
                        record_id: record.id,
                        matched_by,
                    }
                }
                None => MatchResult::NoMatch,
            },
            Err(e) => {
                warn!(
                    error = %e,
                    transient = e.is_transient(),
                    "Existing-record lookup failed; continuing as no match"
                );
                MatchResult::NoMatch
            }
        }
    }
}

/// Equality filter on email and/or phone; a disjunction only when both are
/// present.
pub fn identity_filter(email: Option<&str>, phone: Option<&str>) -> Option<Filter> {
    match (email, phone) {
        (Some(email), Some(phone)) => Some(Filter::or(vec![
            Filter::email_equals(EMAIL_PROPERTY, email),
            Filter::phone_equals(PHONE_PROPERTY, phone),
        ])),
        (Some(email), None) => Some(Filter::email_equals(EMAIL_PROPERTY, email)),
        (None, Some(phone)) => Some(Filter::phone_equals(PHONE_PROPERTY, phone)),
        (None, None) => None,
    }
}

/// Decide which identity field explains a lookup hit. Email is checked first.
fn match_field(record: &StoredRecord, email: Option<&str>, phone: Option<&str>) -> MatchField {
    match (email, phone) {
        (Some(_), None) => MatchField::Email,
        (None, Some(_)) => MatchField::Phone,
        _ => {
            let email_matches = matches!(
                (record.email.as_deref(), email),
                (Some(stored), Some(wanted)) if stored.eq_ignore_ascii_case(wanted)
            );
            if email_matches {
                MatchField::Email
            } else {
                MatchField::Phone
            }
        }
    }
}

#[cfg(test)]
#[path = "upsert_tests.rs"]
mod tests;
