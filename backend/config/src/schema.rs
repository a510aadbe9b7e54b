//! MedBuddy runtime configuration schema.
//!
//! Every section and field is optional in the YAML file; missing values fall
//! back to the constants in [`crate::defaults`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedBuddyConfig {
    /// HTTP server and upload handling
    pub server: ServerConfig,

    /// Vision model used to read sticker crops
    pub model: ModelConfig,

    /// Sticker region detector
    pub detector: DetectorConfig,

    /// Intermediate artifact directories
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Lower-case extensions accepted for the `image` field
    pub allowed_extensions: Vec<String>,
    pub cors_permissive: bool,
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Together,
    Openrouter,
    Openai,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Together => "together",
            ProviderKind::Openrouter => "openrouter",
            ProviderKind::Openai => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Whether the provider needs an API key to be usable.
    pub fn requires_api_key(&self) -> bool {
        matches!(
            self,
            ProviderKind::Together | ProviderKind::Openrouter | ProviderKind::Openai
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    /// Overrides the provider's public endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Segmentation model served over HTTP
    Http,
    /// Whole image treated as a single sticker
    FullFrame,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectorConfig {
    pub kind: DetectorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub min_confidence: f32,
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    pub stickers_dir: PathBuf,
    pub results_dir: PathBuf,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for rolling NDJSON log files; console only when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    pub json_console: bool,
}
