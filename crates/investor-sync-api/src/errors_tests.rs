//! Tests for error → HTTP response mapping.

use super::*;
use investor_sync_core::{RecordId, StoreError};

fn store_failure() -> StoreError {
    StoreError::InvalidResponse {
        message: "page has no id".to_string(),
    }
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

mod status_mapping {
    use super::*;

    #[test]
    fn test_validation_is_bad_request() {
        let error = ApiHandlerError::from(ValidationError::MissingContactMethod);
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.label(), "validation_error");
    }

    /// Verify validation failures raised by the upserter are still 400.
    #[test]
    fn test_upsert_validation_is_bad_request() {
        let error = ApiHandlerError::from(UpsertError::Validation(
            ValidationError::MissingContactMethod,
        ));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.label(), "validation_error");
    }

    #[test]
    fn test_store_failure_is_internal_error() {
        let error = ApiHandlerError::from(UpsertError::CreateFailed(store_failure()));
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.label(), "processing_error");
    }

    #[test]
    fn test_forward_failure_is_internal_error() {
        let error = ApiHandlerError::from(ForwardError::Transport {
            message: "connection refused".to_string(),
        });
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_method_not_allowed() {
        let error = ApiHandlerError::MethodNotAllowed {
            method: "GET".to_string(),
        };
        assert_eq!(error.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }
}

mod bodies {
    use super::*;

    #[tokio::test]
    async fn test_validation_body_shape() {
        let response = ApiHandlerError::from(ValidationError::MissingContactMethod)
            .into_reply(true)
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            body,
            serde_json::json!({
                "success": false,
                "error": "validation_error",
                "message": "Either an email address or a phone number is required"
            })
        );
    }

    /// Verify the underlying store message reaches the caller and details
    /// appear only when requested.
    #[tokio::test]
    async fn test_processing_failure_passes_message_through() {
        let error = || {
            ApiHandlerError::from(UpsertError::UpdateFailed {
                record_id: RecordId::new("page-1").unwrap(),
                source: store_failure(),
            })
        };

        let production = body_json(error().into_reply(false).into_response()).await;
        assert_eq!(production["error"], "processing_error");
        assert!(production["message"]
            .as_str()
            .unwrap()
            .contains("page has no id"));
        assert!(production.get("details").is_none());

        let development = body_json(error().into_reply(true).into_response()).await;
        assert!(development["details"]
            .as_str()
            .unwrap()
            .contains("page has no id"));
    }

    #[test]
    fn test_method_not_allowed_sets_allow_header() {
        let response = ApiHandlerError::MethodNotAllowed {
            method: "PUT".to_string(),
        }
        .into_response();

        assert_eq!(response.headers()[header::ALLOW], "POST, OPTIONS");
    }
}
