//! Client for a segmentation model served over HTTP.
//!
//! The frame is posted as a multipart `file` (PNG) together with the
//! confidence threshold. Two response shapes are understood:
//!
//! ```json
//! {"images":[{"results":[{"confidence":0.91,"segments":{"x":[..],"y":[..]}}]}]}
//! {"predictions":[{"confidence":0.91,"points":[{"x":1.0,"y":2.0}, ...]}]}
//! ```
//!
//! The first is the Ultralytics inference shape, the second the Roboflow one.

use anyhow::{Context, Result};
use async_trait::async_trait;
use image::DynamicImage;
use reqwest::{multipart, Client};
use serde::Deserialize;
use tracing::debug;

use medbuddy_core::{PixelPoint, StickerDetector, StickerRegion};

use crate::crop::encode_png;

pub struct HttpDetector {
    client: Client,
    url: String,
    api_key: Option<String>,
    min_confidence: f32,
}

impl HttpDetector {
    pub fn new(url: impl Into<String>, min_confidence: f32) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            api_key: None,
            min_confidence,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectionResponse {
    Ultralytics { images: Vec<UltralyticsImage> },
    Roboflow { predictions: Vec<RoboflowPrediction> },
}

#[derive(Debug, Deserialize)]
struct UltralyticsImage {
    #[serde(default)]
    results: Vec<UltralyticsResult>,
}

#[derive(Debug, Deserialize)]
struct UltralyticsResult {
    confidence: f32,
    segments: Option<Segments>,
}

#[derive(Debug, Deserialize)]
struct Segments {
    x: Vec<f32>,
    y: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct RoboflowPrediction {
    confidence: f32,
    #[serde(default)]
    points: Vec<PixelPoint>,
}

impl DetectionResponse {
    /// Regions in response order; entries without a mask are dropped.
    fn into_regions(self) -> Vec<StickerRegion> {
        match self {
            DetectionResponse::Ultralytics { images } => images
                .into_iter()
                .flat_map(|img| img.results)
                .filter_map(|r| {
                    let seg = r.segments?;
                    let polygon = seg
                        .x
                        .into_iter()
                        .zip(seg.y)
                        .map(|(x, y)| PixelPoint::new(x, y))
                        .collect();
                    Some(StickerRegion::new(polygon, r.confidence))
                })
                .collect(),
            DetectionResponse::Roboflow { predictions } => predictions
                .into_iter()
                .filter(|p| !p.points.is_empty())
                .map(|p| StickerRegion::new(p.points, p.confidence))
                .collect(),
        }
    }
}

/// Parse a detector reply and apply the confidence threshold.
fn parse_regions(body: &str, min_confidence: f32) -> Result<Vec<StickerRegion>> {
    let response: DetectionResponse =
        serde_json::from_str(body).context("Unrecognized detector response")?;
    Ok(response
        .into_regions()
        .into_iter()
        .filter(|r| r.confidence >= min_confidence)
        .collect())
}

#[async_trait]
impl StickerDetector for HttpDetector {
    fn name(&self) -> &str {
        "http"
    }

    async fn detect(&self, image: &DynamicImage) -> Result<Vec<StickerRegion>> {
        let rgb = image.to_rgb8();
        let png = tokio::task::spawn_blocking(move || encode_png(&rgb))
            .await
            .context("frame encode worker join failed")??;
        let form = multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(png)
                    .file_name("frame.png")
                    .mime_str("image/png")?,
            )
            .text("conf", self.min_confidence.to_string());

        let mut request = self.client.post(&self.url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.context("Detector HTTP request failed")?;
        let status = response.status();
        let body = response.text().await.context("Failed to read detector response")?;
        if !status.is_success() {
            anyhow::bail!("Detector returned {}: {}", status, body);
        }

        let regions = parse_regions(&body, self.min_confidence)?;
        debug!(count = regions.len(), "Detector returned regions");
        Ok(regions)
    }
}
