//! # Investor Sync CLI
//!
//! Operator commands for the investor synchronization system:
//! - Normalize a captured webhook body without touching the store
//! - Save an attribute set directly through the record upserter
//! - Look up an existing record by email or phone
//! - Validate and print the resolved configuration

use anyhow::Context;
use clap::{Parser, Subcommand};
use investor_sync_api::{record_upserter, ConfigError, ServiceConfig};
use investor_sync_core::{
    normalize, AttributeSet, MatchResult, RecordId, UpsertError, UpsertRequest, ValidationError,
    WebhookPayload,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ============================================================================
// CLI Structure
// ============================================================================

/// Investor Sync CLI - deal-platform events to investor records
#[derive(Debug, Parser)]
#[command(name = "investor-sync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Normalize deal-platform events and upsert investor records")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "INVESTOR_SYNC_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Logging filter
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Normalize a webhook body and print the attribute set
    Normalize {
        /// JSON file holding the webhook body
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Create or update a record from an attribute set
    Save {
        /// JSON file holding the attribute set
        #[arg(short, long)]
        file: PathBuf,

        /// Update this record instead of resolving one
        #[arg(long)]
        record_id: Option<String>,

        /// Look for an existing record by email/phone before creating
        #[arg(long)]
        update_existing: bool,
    },

    /// Find an existing record by email and/or phone
    Lookup {
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },

    /// Validate configuration
    Config {
        /// Print the resolved configuration
        #[arg(short, long)]
        show: bool,
    },
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("{0}")]
    Upsert(#[from] UpsertError),

    #[error("I/O error: {0:#}")]
    Io(anyhow::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::Validation(_) | Self::InvalidArgument { .. } => 2,
            Self::Upsert(UpsertError::Validation(_)) => 2,
            Self::Upsert(_) => 3,
            Self::Io(_) => 4,
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Parse arguments, initialize logging, and run the selected command.
pub async fn run_cli() -> Result<String, CliError> {
    let cli = Cli::parse();
    initialize_logging(&cli);
    run(cli).await
}

/// Run a parsed command and return its output.
pub async fn run(cli: Cli) -> Result<String, CliError> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Normalize { file } => execute_normalize_command(&file),
        Commands::Save {
            file,
            record_id,
            update_existing,
        } => execute_save_command(config_path, &file, record_id, update_existing).await,
        Commands::Lookup { email, phone } => execute_lookup_command(config_path, email, phone).await,
        Commands::Config { show } => execute_config_command(config_path, show),
    }
}

/// Install a stderr subscriber so stdout carries only command output.
pub fn initialize_logging(cli: &Cli) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.as_str().into());

    let json_layer = cli.json_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!cli.json_logs).then(|| {
        tracing_subscriber::fmt::layer().with_writer(std::io::stderr)
    });

    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init();
}

// ============================================================================
// Command Implementations
// ============================================================================

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))
        .map_err(CliError::Io)?;

    serde_json::from_str(&text).map_err(|e| CliError::InvalidArgument {
        arg: path.display().to_string(),
        message: format!("not valid JSON for this command: {}", e),
    })
}

fn to_pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn load_config(path: Option<&Path>) -> Result<ServiceConfig, CliError> {
    let path = path.map(|p| p.to_string_lossy().into_owned());
    let config = ServiceConfig::load(path.as_deref())?;
    config.validate()?;
    Ok(config)
}

fn execute_normalize_command(file: &Path) -> Result<String, CliError> {
    info!(file = %file.display(), "Normalizing webhook body");

    let payload: WebhookPayload = read_json(file)?;
    let normalized = normalize(&payload)?;

    Ok(to_pretty(&json!({
        "event": normalized.label,
        "attributes": normalized.attributes,
    })))
}

async fn execute_save_command(
    config_path: Option<&Path>,
    file: &Path,
    record_id: Option<String>,
    update_existing: bool,
) -> Result<String, CliError> {
    let config = load_config(config_path)?;
    let attributes: AttributeSet = read_json(file)?;
    let record_id = record_id.map(RecordId::new).transpose()?;

    info!(
        file = %file.display(),
        explicit_target = record_id.is_some(),
        update_existing = update_existing,
        "Saving attribute set"
    );

    let outcome = record_upserter(&config.store)?
        .upsert(UpsertRequest {
            attributes,
            record_id,
            update_existing,
        })
        .await?;

    Ok(to_pretty(&json!({
        "success": true,
        "action": outcome.action,
        "record_id": outcome.record_id,
        "matched_by": outcome.matched_by,
    })))
}

async fn execute_lookup_command(
    config_path: Option<&Path>,
    email: Option<String>,
    phone: Option<String>,
) -> Result<String, CliError> {
    let mut attributes = AttributeSet::new();
    if let Some(email) = email {
        attributes.insert("email", email);
    }
    if let Some(phone) = phone {
        attributes.insert("phone", phone);
    }
    if !attributes.has_contact_method() {
        return Err(CliError::InvalidArgument {
            arg: "--email/--phone".to_string(),
            message: "at least one non-empty identity is required".to_string(),
        });
    }

    let config = load_config(config_path)?;
    let result = record_upserter(&config.store)?.find_existing(&attributes).await;

    debug!(result = ?result, "Lookup finished");

    let output = match result {
        MatchResult::Matched {
            record_id,
            matched_by,
        } => json!({"found": true, "record_id": record_id, "matched_by": matched_by}),
        MatchResult::NoMatch => json!({"found": false}),
    };
    Ok(to_pretty(&output))
}

fn execute_config_command(config_path: Option<&Path>, show: bool) -> Result<String, CliError> {
    let config = load_config(config_path)?;

    if !show {
        return Ok("Configuration is valid".to_string());
    }

    let mut shown = config;
    shown.store.api_key = "<REDACTED>".to_string();
    let value = serde_json::to_value(&shown).map_err(|e| ConfigError::Invalid {
        message: e.to_string(),
    })?;
    Ok(to_pretty(&value))
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
