//! Config file read/write.

use crate::env::resolve_env_vars;
use crate::schema::MedBuddyConfig;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the MedBuddy config directory.
/// Priority: `MEDBUDDY_CONFIG_DIR` env > `~/.medbuddy/` > `./.medbuddy`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MEDBUDDY_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".medbuddy"),
        None => PathBuf::from(".medbuddy"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Load and parse the config from disk, substituting `${VAR}` references.
///
/// Returns `Ok(Default::default())` if the file doesn't exist (first run).
pub async fn load_config(path: &Path) -> Result<MedBuddyConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(MedBuddyConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse YAML text into a typed config, resolving env references.
pub fn parse_config(raw: &str) -> Result<MedBuddyConfig> {
    if raw.trim().is_empty() {
        return Ok(MedBuddyConfig::default());
    }
    let value: Value = serde_yaml::from_str(raw).context("Invalid YAML")?;
    // A comments-only file parses as null.
    let value = if value.is_null() { Value::Object(Default::default()) } else { value };
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    serde_json::from_value(value).context("Config does not match the expected schema")
}

/// Write config to disk atomically (write to temp file, rename).
pub async fn write_config(config: &MedBuddyConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    let tmp_path = path.with_extension("yaml.tmp");
    fs::write(&tmp_path, yaml.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp config: {}", tmp_path.display()))?;

    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to rename temp config to: {}", path.display()))?;

    info!(path = %path.display(), "Wrote config");
    Ok(())
}
