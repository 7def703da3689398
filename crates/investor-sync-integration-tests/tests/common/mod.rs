//! Common test utilities for investor-sync integration tests
//!
//! This module provides:
//! - An in-memory [`RecordStore`] that records every call
//! - A helper that runs the full router on an ephemeral port with the
//!   webhook forwarder pointed back at the same server

use async_trait::async_trait;
use docstore_sdk::{Filter, PropertyMap};
use investor_sync_api::{create_router, AppState, HttpSaveForwarder, ServiceConfig};
use investor_sync_core::{RecordId, RecordStore, RecordUpserter, StoreError, StoredRecord};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

// ============================================================================
// In-memory record store
// ============================================================================

/// Store double that answers lookups from a preset record.
#[derive(Default)]
#[allow(dead_code)]
pub struct InMemoryStore {
    existing: Mutex<Option<StoredRecord>>,
    fail_lookups: bool,
    queries: Mutex<Vec<serde_json::Value>>,
    creates: Mutex<Vec<PropertyMap>>,
    updates: Mutex<Vec<(String, PropertyMap)>>,
}

#[allow(dead_code)]
impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose lookups always fail.
    pub fn failing_lookups() -> Self {
        Self {
            fail_lookups: true,
            ..Self::default()
        }
    }

    /// Store that already holds a record with the given identities.
    pub fn with_existing(id: &str, email: Option<&str>, phone: Option<&str>) -> Self {
        let store = Self::default();
        *store.existing.lock().unwrap() = Some(StoredRecord {
            id: RecordId::new(id).unwrap(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
        });
        store
    }

    /// Serialized filters of every lookup, in order.
    pub fn queries(&self) -> Vec<serde_json::Value> {
        self.queries.lock().unwrap().clone()
    }

    pub fn creates(&self) -> Vec<PropertyMap> {
        self.creates.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(String, PropertyMap)> {
        self.updates.lock().unwrap().clone()
    }

    /// Total number of store calls of any kind.
    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
            + self.creates.lock().unwrap().len()
            + self.updates.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn query_records(
        &self,
        filter: &Filter,
        _limit: u32,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        self.queries
            .lock()
            .unwrap()
            .push(serde_json::to_value(filter).unwrap());

        if self.fail_lookups {
            return Err(StoreError::InvalidResponse {
                message: "lookup unavailable".to_string(),
            });
        }
        Ok(self.existing.lock().unwrap().clone().into_iter().collect())
    }

    async fn create_record(&self, properties: &PropertyMap) -> Result<StoredRecord, StoreError> {
        let mut creates = self.creates.lock().unwrap();
        creates.push(properties.clone());
        Ok(StoredRecord {
            id: RecordId::new(format!("page-{}", creates.len())).unwrap(),
            email: None,
            phone: None,
        })
    }

    async fn update_record(
        &self,
        record_id: &RecordId,
        properties: &PropertyMap,
    ) -> Result<StoredRecord, StoreError> {
        self.updates
            .lock()
            .unwrap()
            .push((record_id.to_string(), properties.clone()));
        Ok(StoredRecord {
            id: record_id.clone(),
            email: None,
            phone: None,
        })
    }
}

// ============================================================================
// Running service
// ============================================================================

/// The full router served on a local port.
pub struct TestService {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    handle: JoinHandle<()>,
}

#[allow(dead_code)]
impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> reqwest::Response {
        self.client.post(self.url(path)).json(&body).send().await.unwrap()
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serve the router over `store`, forwarding webhooks to its own save
/// endpoint.
pub async fn spawn_service(store: Arc<dyn RecordStore>) -> TestService {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = ServiceConfig::default();
    config.forwarding.save_url = format!("http://{}/api/investors", addr);
    config.forwarding.timeout_seconds = 5;

    let upserter = Arc::new(RecordUpserter::new(store, "group-1"));
    let forwarder = Arc::new(HttpSaveForwarder::new(&config.forwarding).unwrap());
    let app = create_router(AppState::new(config, upserter, forwarder));

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestService {
        addr,
        client: reqwest::Client::new(),
        handle,
    }
}
