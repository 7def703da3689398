// Database query operations.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::client::{DocStoreClient, Page};
use crate::error::ApiError;

/// Query filter.
///
/// Serializes to the store's filter object: a single property condition
/// (`{"property": "Email", "email": {"equals": "..."}}`) or a compound
/// `{"or": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Filter {
    Property {
        property: String,
        #[serde(flatten)]
        condition: PropertyCondition,
    },
    Or {
        or: Vec<Filter>,
    },
}

impl Filter {
    /// Email property equality.
    pub fn email_equals(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Property {
            property: property.into(),
            condition: PropertyCondition::Email(Equals::new(value)),
        }
    }

    /// Phone property equality.
    pub fn phone_equals(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Property {
            property: property.into(),
            condition: PropertyCondition::PhoneNumber(Equals::new(value)),
        }
    }

    /// Disjunction of filters.
    pub fn or(filters: Vec<Filter>) -> Self {
        Self::Or { or: filters }
    }
}

/// Typed condition applied to one property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyCondition {
    Email(Equals),
    PhoneNumber(Equals),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Equals {
    pub equals: String,
}

impl Equals {
    fn new(value: impl Into<String>) -> Self {
        Self {
            equals: value.into(),
        }
    }
}

/// Request body for a database query.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

impl QueryRequest {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    /// Limit the number of results returned.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// One page of query results.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    pub results: Vec<Page>,

    #[serde(default)]
    pub has_more: bool,

    #[serde(default)]
    pub next_cursor: Option<String>,
}

impl DocStoreClient {
    /// Query a database for pages matching a filter.
    #[instrument(skip(self, request))]
    pub async fn query_database(
        &self,
        database_id: &str,
        request: &QueryRequest,
    ) -> Result<QueryResponse, ApiError> {
        self.send_json(
            Method::POST,
            &["v1", "databases", database_id, "query"],
            request,
        )
        .await
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
