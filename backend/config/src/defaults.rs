//! Config defaults: the values used when a section or field is absent.

use crate::schema::{
    DetectorConfig, DetectorKind, LoggingConfig, ModelConfig, ProviderKind, ServerConfig,
    StorageConfig,
};

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// 16 MiB upload ceiling.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

pub const DEFAULT_MODEL: &str = "meta-llama/Llama-Vision-Free";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// Minimum detector confidence for a region to be read.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

pub const DEFAULT_STICKERS_DIR: &str = "detected_stickers";
pub const DEFAULT_RESULTS_DIR: &str = "json_results";

pub const DEFAULT_LOG_LEVEL: &str = "info";

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            upload_dir: DEFAULT_UPLOAD_DIR.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            cors_permissive: true,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Together,
            base_url: None,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            kind: DetectorKind::FullFrame,
            url: None,
            api_key: None,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            stickers_dir: DEFAULT_STICKERS_DIR.into(),
            results_dir: DEFAULT_RESULTS_DIR.into(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            dir: None,
            json_console: false,
        }
    }
}
