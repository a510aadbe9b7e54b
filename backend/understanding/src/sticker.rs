//! Reads one cropped sticker through a vision model.

use std::sync::Arc;

use medbuddy_core::{MedicationSchedule, VisionProvider, VisionRequest};
use medbuddy_logging::{loggable_reply, redact_sensitive_data};
use medbuddy_media::png_data_uri;
use tracing::{debug, info};

use crate::extract::extract;
use crate::prompt::{system_prompt, USER_PROMPT};
use crate::schema::{parse_schedule, SchemaViolation};

pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// Why a sticker produced no schedule.
#[derive(Debug)]
pub enum ReadFailure {
    /// The model call itself failed.
    Transport(String),
    /// No JSON object could be recovered from the reply.
    NoJson { reply: String },
    /// JSON was found but is not a valid schedule.
    Invalid { reply: String, violation: SchemaViolation },
}

impl ReadFailure {
    pub fn reason(&self) -> String {
        match self {
            ReadFailure::Transport(e) => format!("model call failed: {e}"),
            ReadFailure::NoJson { .. } => "no JSON object in reply".to_string(),
            ReadFailure::Invalid { violation, .. } => format!("schema violation: {violation}"),
        }
    }

    pub fn reply(&self) -> Option<&str> {
        match self {
            ReadFailure::Transport(_) => None,
            ReadFailure::NoJson { reply } | ReadFailure::Invalid { reply, .. } => Some(reply),
        }
    }
}

/// Sends sticker crops to a [`VisionProvider`] and validates the answer.
pub struct StickerReader {
    provider: Arc<dyn VisionProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    system_prompt: String,
}

impl StickerReader {
    pub fn new(provider: Arc<dyn VisionProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: system_prompt(),
        }
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Read a PNG-encoded sticker, returning the reason on failure.
    pub async fn try_read(&self, png: &[u8]) -> Result<MedicationSchedule, ReadFailure> {
        let request = VisionRequest {
            model: self.model.clone(),
            system_prompt: self.system_prompt.clone(),
            user_prompt: USER_PROMPT.to_string(),
            image_data_uri: png_data_uri(png),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .provider
            .complete(&request)
            .await
            .map_err(|e| ReadFailure::Transport(redact_sensitive_data(&format!("{e:#}"))))?;

        info!(
            provider = %response.provider,
            model = %response.model,
            tokens = response.tokens_used,
            latency_ms = response.latency_ms,
            "Model replied"
        );
        debug!(reply = %loggable_reply(&response.content), "Raw model reply");

        let reply = response.content;
        let Some(candidate) = extract(&reply) else {
            return Err(ReadFailure::NoJson { reply });
        };
        parse_schedule(&candidate).map_err(|violation| ReadFailure::Invalid { reply, violation })
    }
}
