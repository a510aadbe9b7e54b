//! `medbuddy-config`: runtime configuration for the MedBuddy server.
//!
//! Provides:
//! - Typed config schema (server, model, detector, storage, logging)
//! - YAML read/write
//! - `${ENV_VAR}` substitution and `MEDBUDDY_*` environment overrides
//! - Default values
//! - Validation with errors and warnings
//! - Redacted snapshots for logging

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::{apply_env_overrides, apply_env_overrides_with, resolve_env_vars, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, parse_config, write_config};
pub use redact::redact;
pub use schema::{
    DetectorConfig, DetectorKind, LoggingConfig, MedBuddyConfig, ModelConfig, ProviderKind,
    ServerConfig, StorageConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Result};
use std::path::Path;

/// Load the file and apply environment overrides, without validating.
pub async fn load_with_overrides(path: &Path) -> Result<MedBuddyConfig> {
    let config = load_config(path).await?;
    Ok(apply_env_overrides(config))
}

/// Validate a loaded config, logging warnings and errors.
///
/// Call after the logger is installed so the report is visible. Any
/// validation error aborts.
pub fn ensure_valid(config: &MedBuddyConfig) -> Result<()> {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if !report.is_valid() {
        bail!(
            "invalid configuration: {}",
            report
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        );
    }

    tracing::debug!(config = %redact(config), "Effective config");
    Ok(())
}

/// Load, apply environment overrides, and validate in one step.
pub async fn load_and_prepare(path: &Path) -> Result<MedBuddyConfig> {
    let config = load_with_overrides(path).await?;
    ensure_valid(&config)?;
    Ok(config)
}
