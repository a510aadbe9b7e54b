//! Decoding, polygon masking and cropping of sticker regions, and PNG encoding.

use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use medbuddy_core::{MedError, PixelRect, StickerRegion};

/// Decode an uploaded file into an image.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, MedError> {
    if bytes.is_empty() {
        return Err(MedError::EmptyImage);
    }
    image::load_from_memory(bytes).map_err(|e| MedError::ImageDecode(e.to_string()))
}

/// [`decode_image`] on the blocking pool.
pub async fn decode_image_blocking(bytes: Vec<u8>) -> Result<DynamicImage, MedError> {
    tokio::task::spawn_blocking(move || decode_image(&bytes))
        .await
        .context("image decode worker join failed")?
}

/// A masked, bounding-box cropped sticker.
#[derive(Debug, Clone)]
pub struct StickerCrop {
    pub rect: PixelRect,
    pub image: RgbImage,
}

/// Crop one region: pixels outside the polygon are blacked out, then the
/// polygon's bounding box is cut from the frame.
///
/// Returns `None` for polygons with fewer than three distinct vertices.
pub fn crop_region(image: &DynamicImage, region: &StickerRegion) -> Option<StickerCrop> {
    let (width, height) = (image.width(), image.height());
    let rect = region.bounding_rect(width, height)?;

    let local: Vec<Point<i32>> = region
        .clamped_vertices(width, height)
        .into_iter()
        .map(|(x, y)| Point::new(x - rect.x as i32, y - rect.y as i32))
        .collect();

    let mut mask = GrayImage::new(rect.width, rect.height);
    draw_polygon_mut(&mut mask, &local, Luma([255u8]));

    let source = image.to_rgb8();
    let crop = RgbImage::from_fn(rect.width, rect.height, |x, y| {
        if mask.get_pixel(x, y)[0] > 0 {
            *source.get_pixel(rect.x + x, rect.y + y)
        } else {
            Rgb([0, 0, 0])
        }
    });

    Some(StickerCrop { rect, image: crop })
}

/// Encode an RGB image as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, MedError> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| MedError::Storage(format!("PNG encoding failed: {e}")))?;
    Ok(buf.into_inner())
}

/// [`crop_region`] then [`encode_png`] on the blocking pool.
///
/// `Ok(None)` means the region has no area inside the image.
pub async fn crop_to_png(image: Arc<DynamicImage>, region: StickerRegion) -> Result<Option<Vec<u8>>, MedError> {
    tokio::task::spawn_blocking(move || {
        crop_region(&image, &region)
            .map(|crop| encode_png(&crop.image))
            .transpose()
    })
    .await
    .context("sticker crop worker join failed")?
}

/// `data:image/png;base64,...` URI for PNG bytes.
pub fn png_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}
