//! Tests for component construction.

use super::*;
use investor_sync_core::{AttributeSet, UpsertAction, UpsertRequest};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(api_url: &str) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.store.api_key = "secret_test".to_string();
    config.store.database_id = "db-1".to_string();
    config.store.group_record_id = "group-1".to_string();
    config.store.api_url = api_url.to_string();
    config
}

#[test]
fn test_invalid_store_url_is_configuration_error() {
    let result = build_components(&config_for("::not a url::"));
    assert!(matches!(result, Err(ServiceError::Configuration(_))));
}

#[test]
fn test_invalid_save_url_is_configuration_error() {
    let mut config = config_for("https://store.example");
    config.forwarding.save_url = "relative/path".to_string();
    let result = build_components(&config);
    assert!(matches!(result, Err(ServiceError::Configuration(_))));
}

/// Verify the wired upserter talks to the configured database with the
/// configured credentials and group.
#[tokio::test]
async fn test_wired_upserter_creates_in_configured_database() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .and(header("Authorization", "Bearer secret_test"))
        .and(body_partial_json(json!({
            "parent": {"database_id": "db-1"},
            "properties": {
                "Email": {"email": "ada@example.com"},
                "Group": {"relation": [{"id": "group-1"}]}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "page",
            "id": "page-1",
            "properties": {}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let components = build_components(&config_for(&mock_server.uri())).unwrap();

    let mut attributes = AttributeSet::new();
    attributes.insert("email", "ada@example.com");
    let outcome = components
        .upserter
        .upsert(UpsertRequest {
            attributes,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(outcome.action, UpsertAction::Created);
    assert_eq!(outcome.record_id.as_str(), "page-1");
}
