//! Full pipeline against a mocked document store API.

mod common;

use common::spawn_service;
use docstore_sdk::{ClientConfig, DocStoreClient};
use investor_sync_core::adapters::DocStoreRecordStore;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> Arc<DocStoreRecordStore> {
    let client = DocStoreClient::builder("secret_test")
        .config(ClientConfig::default().with_api_url(server.uri()))
        .build()
        .unwrap();
    Arc::new(DocStoreRecordStore::new(client, "db-1"))
}

/// Verify a webhook for a known investor queries, then patches the matched
/// page through the store API.
#[tokio::test]
async fn test_webhook_updates_matched_page() {
    // Arrange
    let docstore = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/databases/db-1/query"))
        .and(header("Authorization", "Bearer secret_test"))
        .and(body_partial_json(json!({
            "filter": {"property": "Email", "email": {"equals": "ada@example.com"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "results": [{
                "object": "page",
                "id": "page-5",
                "properties": {
                    "Email": {"type": "email", "email": "ada@example.com"}
                }
            }],
            "has_more": false,
            "next_cursor": null
        })))
        .expect(1)
        .mount(&docstore)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/v1/pages/page-5"))
        .and(body_partial_json(json!({
            "properties": {
                "Accredited": {"checkbox": true},
                "Group": {"relation": [{"id": "group-1"}]}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "page",
            "id": "page-5",
            "properties": {}
        })))
        .expect(1)
        .mount(&docstore)
        .await;

    let service = spawn_service(store_for(&docstore)).await;

    // Act
    let response = service
        .post_json(
            "/api/webhooks/deal",
            json!({
                "event": "investor.updated",
                "investor": {"email": "ada@example.com", "accredited_investor": true}
            }),
        )
        .await;

    // Assert
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["action"], "updated");
    assert_eq!(body["record_id"], "page-5");
    assert_eq!(body["matched_by"], "email");
}

/// Verify a store write failure surfaces as a 500 from both endpoints.
#[tokio::test]
async fn test_store_failure_is_processing_error() {
    // Arrange
    let docstore = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "object": "error",
            "status": 400,
            "code": "validation_error",
            "message": "Phone is not a property that exists."
        })))
        .mount(&docstore)
        .await;

    let service = spawn_service(store_for(&docstore)).await;

    // Act
    let saved = service
        .post_json("/api/investors", json!({"email": "ada@example.com"}))
        .await;
    let forwarded = service
        .post_json(
            "/api/webhooks/deal",
            json!({"event": "investor.created", "investor": {"email": "ada@example.com"}}),
        )
        .await;

    // Assert
    assert_eq!(saved.status(), 500);
    let saved: serde_json::Value = saved.json().await.unwrap();
    assert_eq!(saved["error"], "processing_error");

    assert_eq!(forwarded.status(), 500);
    let forwarded: serde_json::Value = forwarded.json().await.unwrap();
    assert_eq!(forwarded["error"], "processing_error");
    assert!(forwarded["message"]
        .as_str()
        .unwrap()
        .contains(saved["message"].as_str().unwrap()));
}
