use anyhow::Result;
use async_trait::async_trait;
use image::DynamicImage;

use crate::region::StickerRegion;

/// Trait for hosted vision-language models that read sticker crops.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name (e.g., "together", "ollama").
    fn name(&self) -> &str;

    /// Send a chat completion carrying one image and return the reply text.
    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse>;
}

/// Locates sticker regions in an uploaded photo.
#[async_trait]
pub trait StickerDetector: Send + Sync {
    fn name(&self) -> &str;

    /// Regions in the detector's emission order.
    async fn detect(&self, image: &DynamicImage) -> Result<Vec<StickerRegion>>;
}

/// Request to a vision provider.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    /// Base64 `data:` URI of the image.
    pub image_data_uri: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl VisionRequest {
    /// MIME type and raw base64 payload of the attached image.
    pub fn image_parts(&self) -> Option<(&str, &str)> {
        let rest = self.image_data_uri.strip_prefix("data:")?;
        let (mime, payload) = rest.split_once(";base64,")?;
        Some((mime, payload))
    }
}

/// Response from a vision provider.
#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
