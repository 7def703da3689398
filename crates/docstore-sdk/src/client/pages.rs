// Page create/update operations.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::instrument;

use crate::client::DocStoreClient;
use crate::error::ApiError;
use crate::properties::PropertyMap;

/// A page (record) as returned by the store.
///
/// Properties are kept as raw JSON because read responses carry extra keys
/// (`id`, `type`) that the write-side [`PropertyValue`](crate::PropertyValue)
/// shape does not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Store-assigned page identifier
    pub id: String,

    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub last_edited_time: Option<DateTime<Utc>>,

    /// Page URL in the store's UI
    #[serde(default)]
    pub url: Option<String>,

    /// Raw property values keyed by display name
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

impl Page {
    /// Read a property as plain text.
    ///
    /// Handles the scalar-ish property types (email, phone, title, rich text,
    /// select, number). Returns `None` for missing or empty properties.
    pub fn plain_text(&self, name: &str) -> Option<String> {
        let property = self.properties.get(name)?;
        let kind = property.get("type").and_then(Value::as_str).or_else(|| {
            ["email", "phone_number", "title", "rich_text", "select", "number"]
                .into_iter()
                .find(|k| property.get(*k).is_some())
        })?;

        let value = property.get(kind)?;
        let text = match kind {
            "email" | "phone_number" => value.as_str().map(str::to_string),
            "number" => value.as_f64().map(|n| n.to_string()),
            "select" => value
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            "title" | "rich_text" => value.as_array().map(|runs| {
                runs.iter()
                    .filter_map(|run| {
                        run.get("plain_text")
                            .or_else(|| run.get("text").and_then(|t| t.get("content")))
                            .and_then(Value::as_str)
                    })
                    .collect::<String>()
            }),
            _ => None,
        }?;

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Parent reference for page creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    pub database_id: String,
}

/// Request body for creating a page inside a database.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePageRequest {
    pub parent: Parent,
    pub properties: PropertyMap,
}

impl CreatePageRequest {
    pub fn new(database_id: impl Into<String>, properties: PropertyMap) -> Self {
        Self {
            parent: Parent {
                database_id: database_id.into(),
            },
            properties,
        }
    }
}

/// Request body for updating page properties.
///
/// Properties not present in the map are left untouched by the store.
#[derive(Debug, Clone, Serialize)]
pub struct UpdatePageRequest {
    pub properties: PropertyMap,
}

impl DocStoreClient {
    /// Create a new page in the database named by `request.parent`.
    #[instrument(skip(self, request), fields(database_id = %request.parent.database_id, property_count = request.properties.len()))]
    pub async fn create_page(&self, request: &CreatePageRequest) -> Result<Page, ApiError> {
        self.send_json(Method::POST, &["v1", "pages"], request).await
    }

    /// Update properties on an existing page.
    #[instrument(skip(self, request), fields(property_count = request.properties.len()))]
    pub async fn update_page(
        &self,
        page_id: &str,
        request: &UpdatePageRequest,
    ) -> Result<Page, ApiError> {
        self.send_json(Method::PATCH, &["v1", "pages", page_id], request)
            .await
    }
}

#[cfg(test)]
#[path = "pages_tests.rs"]
mod tests;
