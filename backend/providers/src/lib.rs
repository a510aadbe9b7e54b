//! Vision-language model clients.
//!
//! All providers implement [`medbuddy_core::VisionProvider`]; the server picks
//! one at start-up with [`from_config`] and shares it across requests.

pub mod mock;
pub mod ollama;
pub mod openai_compat;

use std::sync::Arc;

use medbuddy_config::{ModelConfig, ProviderKind};
use medbuddy_core::{MedError, VisionProvider};
use tracing::info;

pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai_compat::OpenAiCompatProvider;

/// Build the configured provider.
pub fn from_config(config: &ModelConfig) -> Result<Arc<dyn VisionProvider>, MedError> {
    let api_key = || {
        config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                MedError::Config(format!(
                    "provider '{}' requires an API key",
                    config.provider.as_str()
                ))
            })
    };

    let provider: Arc<dyn VisionProvider> = match config.provider {
        ProviderKind::Together => Arc::new(with_base(OpenAiCompatProvider::together(api_key()?), config)),
        ProviderKind::Openrouter => {
            Arc::new(with_base(OpenAiCompatProvider::openrouter(api_key()?), config))
        }
        ProviderKind::Openai => Arc::new(with_base(OpenAiCompatProvider::openai(api_key()?), config)),
        ProviderKind::Ollama => {
            let provider = OllamaProvider::new();
            match &config.base_url {
                Some(url) => Arc::new(provider.with_base_url(url)),
                None => Arc::new(provider),
            }
        }
    };

    info!(provider = provider.name(), model = %config.model, "Vision provider ready");
    Ok(provider)
}

fn with_base(provider: OpenAiCompatProvider, config: &ModelConfig) -> OpenAiCompatProvider {
    match &config.base_url {
        Some(url) => provider.with_base_url(url),
        None => provider,
    }
}
