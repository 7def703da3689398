//! [`RecordStore`] backed by a document-store database.

use crate::properties::{EMAIL_PROPERTY, PHONE_PROPERTY};
use crate::upsert::{RecordStore, StoreError, StoredRecord};
use crate::RecordId;
use async_trait::async_trait;
use docstore_sdk::{
    CreatePageRequest, DocStoreClient, Filter, Page, PropertyMap, QueryRequest, UpdatePageRequest,
};
use tracing::{debug, instrument};

/// Record store writing to one database through [`DocStoreClient`].
#[derive(Debug, Clone)]
pub struct DocStoreRecordStore {
    client: DocStoreClient,
    database_id: String,
}

impl DocStoreRecordStore {
    pub fn new(client: DocStoreClient, database_id: impl Into<String>) -> Self {
        Self {
            client,
            database_id: database_id.into(),
        }
    }
}

/// Convert a store page into the upserter's view of a record.
fn to_stored_record(page: &Page) -> Result<StoredRecord, StoreError> {
    let id = RecordId::new(page.id.as_str()).map_err(|e| StoreError::InvalidResponse {
        message: format!("page id '{}' is unusable: {}", page.id, e),
    })?;

    Ok(StoredRecord {
        id,
        email: page.plain_text(EMAIL_PROPERTY),
        phone: page.plain_text(PHONE_PROPERTY),
    })
}

#[async_trait]
impl RecordStore for DocStoreRecordStore {
    #[instrument(skip(self, filter), fields(database_id = %self.database_id))]
    async fn query_records(
        &self,
        filter: &Filter,
        limit: u32,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let request = QueryRequest::new(filter.clone()).with_page_size(limit);
        let response = self
            .client
            .query_database(&self.database_id, &request)
            .await?;

        debug!(
            result_count = response.results.len(),
            has_more = response.has_more,
            "Database query returned"
        );

        response
            .results
            .iter()
            .take(limit as usize)
            .map(to_stored_record)
            .collect()
    }

    #[instrument(skip(self, properties), fields(database_id = %self.database_id))]
    async fn create_record(&self, properties: &PropertyMap) -> Result<StoredRecord, StoreError> {
        let request = CreatePageRequest::new(self.database_id.clone(), properties.clone());
        let page = self.client.create_page(&request).await?;
        to_stored_record(&page)
    }

    #[instrument(skip(self, properties), fields(record_id = %record_id))]
    async fn update_record(
        &self,
        record_id: &RecordId,
        properties: &PropertyMap,
    ) -> Result<StoredRecord, StoreError> {
        let request = UpdatePageRequest {
            properties: properties.clone(),
        };
        let page = self
            .client
            .update_page(record_id.as_str(), &request)
            .await?;
        to_stored_record(&page)
    }
}

#[cfg(test)]
#[path = "docstore_tests.rs"]
mod tests;
