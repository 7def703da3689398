//! Webhook → forwarder → save endpoint → store, over real HTTP.

mod common;

use common::{spawn_service, InMemoryStore};
use docstore_sdk::PropertyValue;
use serde_json::json;
use std::sync::Arc;

/// Verify a funded event travels through the save endpoint and lands as a
/// new record with the event's overrides applied.
#[tokio::test]
async fn test_funded_webhook_creates_record() {
    // Arrange
    let store = Arc::new(InMemoryStore::new());
    let service = spawn_service(store.clone()).await;

    // Act
    let response = service
        .post_json(
            "/api/webhooks/deal",
            json!({
                "event": "investor.funded",
                "investor": {
                    "email": "ada@example.com",
                    "first_name": "Ada",
                    "last_name": "Lovelace",
                    "investment_amount": 1000
                },
                "deal": {"id": "deal-9", "title": "Series Seed"}
            }),
        )
        .await;

    // Assert
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["event"], "investor.funded");
    assert_eq!(body["action"], "created");
    assert_eq!(body["record_id"], "page-1");

    // The forwarded save always performs an identity lookup first
    assert_eq!(
        store.queries(),
        vec![json!({"property": "Email", "email": {"equals": "ada@example.com"}})]
    );

    let creates = store.creates();
    assert_eq!(creates.len(), 1);
    let properties = &creates[0];
    assert_eq!(properties["Funded"], PropertyValue::Checkbox(true));
    assert_eq!(properties["Investor State"], PropertyValue::select("funded"));
    assert_eq!(properties["Name"], PropertyValue::title("Ada Lovelace"));
    assert_eq!(properties["Investment Amount"], PropertyValue::Number(1000.0));
    assert_eq!(properties["Group"], PropertyValue::relation("group-1"));
    assert!(properties.contains_key("Created At"));
}

/// Verify a repeat event for a known investor updates the existing record.
#[tokio::test]
async fn test_webhook_for_known_investor_updates() {
    // Arrange
    let store = Arc::new(InMemoryStore::with_existing(
        "page-42",
        None,
        Some("+15550100"),
    ));
    let service = spawn_service(store.clone()).await;

    // Act
    let response = service
        .post_json(
            "/api/webhooks/deal",
            json!({
                "event": "investor.signed",
                "data": {"phone_number": "+15550100", "first_name": "Ada"}
            }),
        )
        .await;

    // Assert
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["action"], "updated");
    assert_eq!(body["record_id"], "page-42");
    assert_eq!(body["matched_by"], "phone");

    assert!(store.creates().is_empty());
    let updates = store.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, "page-42");
    assert_eq!(
        updates[0].1["Investor State"],
        PropertyValue::select("signed")
    );
    assert!(!updates[0].1.contains_key("Created At"));
}

/// Verify a webhook without email or phone never reaches the store.
#[tokio::test]
async fn test_webhook_without_contact_is_rejected() {
    // Arrange
    let store = Arc::new(InMemoryStore::new());
    let service = spawn_service(store.clone()).await;

    // Act
    let response = service
        .post_json(
            "/api/webhooks/deal",
            json!({"event": "investor.created", "investor": {"first_name": "Ada"}}),
        )
        .await;

    // Assert
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_unrecognized_event_passes_fields_through() {
    // Arrange
    let store = Arc::new(InMemoryStore::new());
    let service = spawn_service(store.clone()).await;

    // Act
    let response = service
        .post_json(
            "/api/webhooks/deal",
            json!({"event": "investor.archived", "investor": {"email": "ada@example.com"}}),
        )
        .await;

    // Assert
    assert_eq!(response.status(), 200);
    let creates = store.creates();
    assert_eq!(creates.len(), 1);
    assert!(!creates[0].contains_key("Investor State"));
    assert!(!creates[0].contains_key("Funded"));
}

/// Verify an update carrying only an email leaves existing names untouched.
#[tokio::test]
async fn test_update_without_names_does_not_clear_them() {
    // Arrange
    let store = Arc::new(InMemoryStore::with_existing(
        "page-8",
        Some("ada@example.com"),
        None,
    ));
    let service = spawn_service(store.clone()).await;

    // Act
    let response = service
        .post_json(
            "/api/webhooks/deal",
            json!({
                "event": "investor.funded",
                "investor": {"email": "ada@example.com", "first_name": "  "}
            }),
        )
        .await;

    // Assert
    assert_eq!(response.status(), 200);
    let updates = store.updates();
    assert_eq!(updates.len(), 1);
    let properties = &updates[0].1;
    assert_eq!(properties["Funded"], PropertyValue::Checkbox(true));
    for name in ["Name", "First Name", "Last Name"] {
        assert!(!properties.contains_key(name), "{} was written", name);
    }
}
