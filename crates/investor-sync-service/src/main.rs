//! # Investor Sync Service
//!
//! Binary entry point for the investor synchronization HTTP service.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes structured logging
//! - Builds the document-store client, record upserter, and forwarder
//! - Starts the HTTP server from investor-sync-api

mod wiring;

use investor_sync_api::{start_server, LoggingConfig, ServiceConfig, ServiceError};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Configuration decides the log format, so it is loaded first. Failures
    // are reported through default logging.
    let service_config = match ServiceConfig::load(None) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            error!(error = %e, "Failed to load configuration; aborting");
            std::process::exit(3);
        }
    };

    init_tracing(&service_config.logging);

    info!(
        environment = %service_config.environment,
        "Starting Investor Sync Service"
    );

    if let Err(e) = service_config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(3);
    }

    let components = match wiring::build_components(&service_config) {
        Ok(components) => components,
        Err(e) => {
            error!(error = %e, "Failed to build service components; aborting");
            std::process::exit(3);
        }
    };

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        database_id = %service_config.store.database_id,
        save_url = %service_config.forwarding.save_url,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(service_config, components.upserter, components.forwarder).await {
        error!("Failed to start server: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => 3,
        };

        std::process::exit(exit_code);
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level. JSON output replaces the
/// human-readable formatter when `json_format` is set.
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.as_str().into());

    let json_layer = logging
        .json_format
        .then(|| tracing_subscriber::fmt::layer().json());
    let text_layer = (!logging.json_format).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
