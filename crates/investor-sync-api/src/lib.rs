//! # Investor Sync HTTP Service
//!
//! HTTP surface for the investor synchronization system.
//!
//! This service provides:
//! - `POST /api/investors`: save an attribute set (create or update a record)
//! - `POST /api/webhooks/deal`: normalize a deal-platform webhook and forward
//!   it to the save endpoint
//! - `GET /health`: liveness
//!
//! Both write endpoints answer `OPTIONS` with an empty 200 and every other
//! method with 405.

pub mod config;
pub mod errors;
pub mod forwarder;
pub mod responses;
pub mod store;

pub use config::{ForwardingConfig, LoggingConfig, ServerConfig, ServiceConfig, StoreConfig};
pub use errors::{ApiHandlerError, ConfigError, ErrorReply, ServiceError};
pub use forwarder::HttpSaveForwarder;
pub use responses::{ErrorResponse, HealthResponse, SaveRequest, SaveResponse};
pub use store::record_upserter;

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    middleware,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use investor_sync_core::{
    normalize, RecordId, RecordUpserter, SaveForwarder, UpsertRequest, WebhookPayload,
};
use serde::de::DeserializeOwned;
use std::{
    future::{Future, IntoFuture},
    net::SocketAddr,
    sync::Arc,
    time::Duration,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, instrument, warn};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: Arc<ServiceConfig>,

    /// Record resolution and writes
    pub upserter: Arc<RecordUpserter>,

    /// Hand-off from the webhook endpoint to the save endpoint
    pub forwarder: Arc<dyn SaveForwarder>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: ServiceConfig,
        upserter: Arc<RecordUpserter>,
        forwarder: Arc<dyn SaveForwarder>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            upserter,
            forwarder,
        }
    }

    /// Attach the environment's error-detail policy to a handler error.
    fn reply(&self, error: ApiHandlerError) -> ErrorReply {
        error.into_reply(self.config.is_development())
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let write_routes = Router::new()
        .route(
            "/api/investors",
            post(handle_save)
                .options(handle_preflight)
                .fallback(handle_method_not_allowed),
        )
        .route(
            "/api/webhooks/deal",
            post(handle_deal_webhook)
                .options(handle_preflight)
                .fallback(handle_method_not_allowed),
        );

    let health_routes = Router::new().route("/health", get(handle_health_check));

    let mut router = Router::new().merge(write_routes).merge(health_routes);

    if state.config.server.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging_middleware))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
pub async fn start_server(
    config: ServiceConfig,
    upserter: Arc<RecordUpserter>,
    forwarder: Arc<dyn SaveForwarder>,
) -> Result<(), ServiceError> {
    let host: std::net::IpAddr =
        config
            .server
            .host
            .parse()
            .map_err(|e| ConfigError::Invalid {
                message: format!("server.host '{}': {}", config.server.host, e),
            })?;
    let addr = SocketAddr::new(host, config.server.port);
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);

    let state = AppState::new(config, upserter, forwarder);
    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.to_string(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", addr);

    let shutdown_signal = async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to install Ctrl+C signal handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    error!(error = %e, "Failed to install SIGTERM signal handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
            },
            _ = terminate => {
                info!("Received SIGTERM, initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
            },
        }
    };

    serve_with_shutdown(listener, app, shutdown_signal, shutdown_timeout).await?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Serve `app` until `signal` resolves, then let in-flight requests finish.
///
/// Requests still running `drain_timeout` after the signal are dropped and
/// the function returns.
pub async fn serve_with_shutdown<F>(
    listener: tokio::net::TcpListener,
    app: Router,
    signal: F,
    drain_timeout: Duration,
) -> Result<(), ServiceError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (signalled_tx, mut signalled_rx) = tokio::sync::watch::channel(false);

    let graceful = async move {
        signal.await;
        let _ = signalled_tx.send(true);
    };
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(graceful)
        .into_future();

    let drain_deadline = async move {
        if signalled_rx.wait_for(|signalled| *signalled).await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(drain_timeout).await;
    };

    tokio::select! {
        result = server => result.map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        }),
        _ = drain_deadline => {
            warn!(
                timeout_ms = drain_timeout.as_millis() as u64,
                "Graceful shutdown timed out, dropping in-flight requests"
            );
            Ok(())
        }
    }
}

// ============================================================================
// Write Handlers
// ============================================================================

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiHandlerError> {
    serde_json::from_slice(body).map_err(|e| ApiHandlerError::MalformedBody {
        message: e.to_string(),
    })
}

/// Save an attribute set, creating or updating a record.
///
/// Resolution: explicit `record_id` → update; `update_existing` → lookup by
/// email/phone, update on hit, create on miss; otherwise create.
#[instrument(skip(state, body), fields(body_size = body.len()))]
pub async fn handle_save(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SaveResponse>, ErrorReply> {
    let request: SaveRequest = parse_body(&body).map_err(|e| state.reply(e))?;

    let record_id = request
        .record_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(RecordId::new)
        .transpose()
        .map_err(|e| state.reply(e.into()))?;

    info!(
        explicit_target = record_id.is_some(),
        update_existing = request.update_existing,
        attribute_count = request.attributes.len(),
        "Received save request"
    );

    let outcome = state
        .upserter
        .upsert(UpsertRequest {
            attributes: request.attributes,
            record_id,
            update_existing: request.update_existing,
        })
        .await
        .map_err(|e| state.reply(e.into()))?;

    Ok(Json(SaveResponse::new(outcome)))
}

/// Normalize a deal-platform webhook and forward it to the save endpoint.
///
/// The forwarded request always asks for an identity lookup so repeated
/// events for one investor update the same record.
#[instrument(skip(state, body), fields(body_size = body.len(), event))]
pub async fn handle_deal_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SaveResponse>, ErrorReply> {
    let payload: WebhookPayload = parse_body(&body).map_err(|e| state.reply(e))?;
    tracing::Span::current().record("event", payload.event_label());

    let normalized = normalize(&payload).map_err(|e| state.reply(e.into()))?;

    let outcome = state
        .forwarder
        .forward(&normalized.attributes, true)
        .await
        .map_err(|e| state.reply(e.into()))?;

    info!(
        event = %normalized.label,
        action = %outcome.action,
        record_id = %outcome.record_id,
        "Deal webhook processed"
    );

    Ok(Json(SaveResponse::new(outcome).with_event(normalized.label)))
}

/// Browser preflight: empty 200.
async fn handle_preflight() -> StatusCode {
    StatusCode::OK
}

async fn handle_method_not_allowed(method: Method) -> ApiHandlerError {
    ApiHandlerError::MethodNotAllowed {
        method: method.to_string(),
    }
}

// ============================================================================
// Health Check Handlers
// ============================================================================

/// Basic health check endpoint
async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware
///
/// - Logs request start and completion with structured fields
/// - Assigns or propagates `x-correlation-id`
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::Span::current().record("correlation_id", correlation_id.as_str());
    request.extensions_mut().insert(correlation_id.clone());

    info!(
        correlation_id = %correlation_id,
        method = %method,
        uri = %uri,
        "Request started"
    );

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert("x-correlation-id", header_value);
    }

    let status = response.status();

    if status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
