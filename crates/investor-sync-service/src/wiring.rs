//! Construction of the long-lived service components.

use investor_sync_api::{record_upserter, HttpSaveForwarder, ServiceConfig, ServiceError};
use investor_sync_core::{RecordUpserter, SaveForwarder};
use std::sync::Arc;
use tracing::info;

/// Components shared by every request for the life of the process.
pub struct Components {
    pub upserter: Arc<RecordUpserter>,
    pub forwarder: Arc<dyn SaveForwarder>,
}

/// Build the upserter and forwarder from configuration.
pub fn build_components(config: &ServiceConfig) -> Result<Components, ServiceError> {
    let upserter = record_upserter(&config.store)?;
    let forwarder = HttpSaveForwarder::new(&config.forwarding)?;

    info!(
        api_url = %config.store.api_url,
        save_url = %forwarder.save_url(),
        "Service components ready"
    );

    Ok(Components {
        upserter: Arc::new(upserter),
        forwarder: Arc::new(forwarder),
    })
}

#[cfg(test)]
#[path = "wiring_tests.rs"]
mod tests;
