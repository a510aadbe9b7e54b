//! Environment handling for config values.
//!
//! Two mechanisms, applied in this order at load time:
//! - `${VAR_NAME}` references inside YAML string values are substituted
//!   (uppercase `[A-Z_][A-Z0-9_]*` names only);
//! - well-known `MEDBUDDY_*` variables and provider API key variables
//!   override the typed config.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::schema::{DetectorKind, MedBuddyConfig, ProviderKind};

static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for a referenced variable that is unset or empty.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references using the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, |name| std::env::var(name).ok())
}

/// Substitute `${VAR}` references using `lookup` (useful for testing).
pub fn resolve_env_vars_with<F>(value: &Value, lookup: F) -> Result<Value>
where
    F: Fn(&str) -> Option<String>,
{
    substitute(value, &lookup, "")
}

fn substitute<F>(value: &Value, lookup: &F, path: &str) -> Result<Value>
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::String(s) if s.contains("${") => {
            let mut missing: Option<String> = None;
            let replaced = ENV_VAR_PATTERN.replace_all(s, |caps: &regex::Captures| {
                match lookup(&caps[1]).filter(|v| !v.is_empty()) {
                    Some(v) => v,
                    None => {
                        missing.get_or_insert_with(|| caps[1].to_string());
                        String::new()
                    }
                }
            });
            if let Some(var_name) = missing {
                bail!(MissingEnvVarError {
                    var_name,
                    config_path: path.to_string(),
                });
            }
            Ok(Value::String(replaced.into_owned()))
        }
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| substitute(v, lookup, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let child = if path.is_empty() { k.clone() } else { format!("{path}.{k}") };
                out.insert(k.clone(), substitute(v, lookup, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

/// Apply `MEDBUDDY_*` and provider key variables from the process environment.
pub fn apply_env_overrides(config: MedBuddyConfig) -> MedBuddyConfig {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

/// Apply environment overrides using `lookup`. Unparseable values are ignored.
pub fn apply_env_overrides_with<F>(mut config: MedBuddyConfig, lookup: F) -> MedBuddyConfig
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(bind) = get("MEDBUDDY_BIND") {
        config.server.bind_address = bind;
    }
    if let Some(port) = get("MEDBUDDY_PORT").and_then(|p| p.parse().ok()) {
        config.server.port = port;
    }
    if let Some(dir) = get("MEDBUDDY_UPLOAD_DIR") {
        config.server.upload_dir = dir.into();
    }

    if let Some(provider) = get("MEDBUDDY_PROVIDER").and_then(|p| parse_provider(&p)) {
        config.model.provider = provider;
    }
    if let Some(model) = get("MEDBUDDY_MODEL") {
        config.model.model = model;
    }
    if let Some(url) = get("MEDBUDDY_MODEL_URL") {
        config.model.base_url = Some(url);
    }
    if config.model.api_key.is_none() {
        let key_var = match config.model.provider {
            ProviderKind::Together => Some("TOGETHER_API_KEY"),
            ProviderKind::Openrouter => Some("OPENROUTER_API_KEY"),
            ProviderKind::Openai => Some("OPENAI_API_KEY"),
            ProviderKind::Ollama => None,
        };
        config.model.api_key = get("MEDBUDDY_API_KEY").or_else(|| key_var.and_then(get));
    }

    if let Some(url) = get("MEDBUDDY_DETECTOR_URL") {
        config.detector.kind = DetectorKind::Http;
        config.detector.url = Some(url);
    }
    if let Some(key) = get("MEDBUDDY_DETECTOR_API_KEY") {
        config.detector.api_key = Some(key);
    }

    if let Some(dir) = get("MEDBUDDY_STICKERS_DIR") {
        config.storage.stickers_dir = dir.into();
    }
    if let Some(dir) = get("MEDBUDDY_RESULTS_DIR") {
        config.storage.results_dir = dir.into();
    }

    if let Some(level) = get("RUST_LOG") {
        config.logging.level = level;
    }
    if let Some(dir) = get("MEDBUDDY_LOG_DIR") {
        config.logging.dir = Some(dir.into());
    }

    config
}

fn parse_provider(s: &str) -> Option<ProviderKind> {
    serde_json::from_value(Value::String(s.trim().to_ascii_lowercase())).ok()
}
