//! Record upserter backed by the configured document store.

use crate::config::StoreConfig;
use crate::errors::ConfigError;
use docstore_sdk::{ClientConfig, DocStoreClient};
use investor_sync_core::adapters::DocStoreRecordStore;
use investor_sync_core::RecordUpserter;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Build an upserter writing to the database named in `config`.
pub fn record_upserter(config: &StoreConfig) -> Result<RecordUpserter, ConfigError> {
    let client_config = ClientConfig::default()
        .with_api_url(config.api_url.as_str())
        .with_api_version(config.api_version.as_str())
        .with_timeout(Duration::from_secs(config.timeout_seconds));

    let client = DocStoreClient::builder(config.api_key.as_str())
        .config(client_config)
        .build()
        .map_err(|e| ConfigError::Invalid {
            message: format!("document store client: {}", e),
        })?;

    debug!(
        api_url = %config.api_url,
        database_id = %config.database_id,
        "Document store client ready"
    );

    let store = DocStoreRecordStore::new(client, config.database_id.as_str());
    Ok(RecordUpserter::new(
        Arc::new(store),
        config.group_record_id.as_str(),
    ))
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
