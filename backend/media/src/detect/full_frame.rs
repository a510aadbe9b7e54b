use anyhow::Result;
use async_trait::async_trait;
use image::DynamicImage;

use medbuddy_core::{StickerDetector, StickerRegion};

/// Treats the whole upload as one sticker, for photos that are already
/// cropped to the label.
#[derive(Debug, Default, Clone, Copy)]
pub struct FullFrameDetector;

#[async_trait]
impl StickerDetector for FullFrameDetector {
    fn name(&self) -> &str {
        "full_frame"
    }

    async fn detect(&self, image: &DynamicImage) -> Result<Vec<StickerRegion>> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(Vec::new());
        }
        Ok(vec![StickerRegion::full_frame(image.width(), image.height())])
    }
}
