//! Configuration types for the HTTP service

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Environment variable naming an operator-supplied configuration file.
pub const CONFIG_FILE_ENV: &str = "INVESTOR_SYNC_CONFIG_FILE";

/// Prefix for environment-variable overrides, e.g.
/// `INVESTOR_SYNC__STORE__API_KEY`.
pub const ENV_PREFIX: &str = "INVESTOR_SYNC";

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Deployment environment name; `development` exposes error details
    pub environment: String,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Document store settings
    pub store: StoreConfig,

    /// Webhook → save endpoint forwarding
    pub forwarding: ForwardingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            environment: "production".to_string(),
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            forwarding: ForwardingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the layered sources.
    ///
    /// Sources, later overriding earlier:
    ///  1. `/etc/investor-sync/service.yaml`
    ///  2. `./config/service.yaml`
    ///  3. `explicit_path`, or the file named by `INVESTOR_SYNC_CONFIG_FILE`
    ///  4. Environment variables prefixed `INVESTOR_SYNC__`
    ///
    /// Missing files are skipped. A malformed file or an uncoercible
    /// environment variable is an error.
    pub fn load(explicit_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(
                config::File::with_name("/etc/investor-sync/service")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            )
            .add_source(
                config::File::with_name("config/service")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            );

        let explicit = explicit_path
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_FILE_ENV).ok())
            .filter(|p| !p.is_empty());

        if let Some(path) = explicit {
            info!(path = %path, "Loading configuration from explicit path");
            builder = builder.add_source(config::File::with_name(&path).required(true));
        }

        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Reject configuration the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require("store.api_key", &self.store.api_key)?;
        require("store.database_id", &self.store.database_id)?;
        require("store.group_record_id", &self.store.group_record_id)?;
        require("forwarding.save_url", &self.forwarding.save_url)?;

        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must be non-zero".to_string(),
            });
        }
        if self.store.timeout_seconds == 0 || self.forwarding.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "timeouts must be at least one second".to_string(),
            });
        }

        Ok(())
    }

    /// True when error responses may carry internal details.
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

fn require(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing {
            key: key.to_string(),
        });
    }
    Ok(())
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
            enable_cors: true,
        }
    }
}

/// Document store configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Integration token
    pub api_key: String,

    /// Database that holds investor records
    pub database_id: String,

    /// Record every investor is related to through the `Group` property
    pub group_record_id: String,

    /// Store API base URL
    pub api_url: String,

    /// Value of the API version header
    pub api_version: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            database_id: String::new(),
            group_record_id: String::new(),
            api_url: "https://api.notion.com".to_string(),
            api_version: "2022-06-28".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("api_key", &"<REDACTED>")
            .field("database_id", &self.database_id)
            .field("group_record_id", &self.group_record_id)
            .field("api_url", &self.api_url)
            .field("api_version", &self.api_version)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Forwarding from the webhook endpoint to the save endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Absolute URL of the save endpoint
    pub save_url: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            save_url: "http://127.0.0.1:8080/api/investors".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "investor_sync_service=info,investor_sync_api=info,investor_sync_core=info,tower_http=debug"
                .to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
