//! Builds the long-lived collaborators from configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use medbuddy_config::{DetectorConfig, DetectorKind, MedBuddyConfig};
use medbuddy_core::StickerDetector;
use medbuddy_media::{ArtifactStore, FullFrameDetector, HttpDetector};
use medbuddy_understanding::{SchedulePipeline, StickerReader};
use tracing::info;

pub fn build_detector(config: &DetectorConfig) -> Result<Arc<dyn StickerDetector>> {
    let detector: Arc<dyn StickerDetector> = match config.kind {
        DetectorKind::FullFrame => Arc::new(FullFrameDetector),
        DetectorKind::Http => {
            let url = config
                .url
                .as_deref()
                .context("detector.url is required for the http detector")?;
            let detector = HttpDetector::new(url, config.min_confidence);
            match &config.api_key {
                Some(key) => Arc::new(detector.with_api_key(key)),
                None => Arc::new(detector),
            }
        }
    };
    info!(detector = detector.name(), "Sticker detector ready");
    Ok(detector)
}

/// Model client, detector and artifact store wired into one pipeline.
pub fn build_pipeline(config: &MedBuddyConfig) -> Result<SchedulePipeline> {
    let provider = medbuddy_providers::from_config(&config.model)?;
    let reader = StickerReader::new(provider, config.model.model.clone())
        .with_sampling(config.model.temperature, config.model.max_tokens);
    let detector = build_detector(&config.detector)?;
    let store = ArtifactStore::new(&config.storage.stickers_dir, &config.storage.results_dir);
    Ok(SchedulePipeline::new(detector, reader, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use medbuddy_config::ProviderKind;

    #[test]
    fn http_detector_needs_url() {
        let config = DetectorConfig {
            kind: DetectorKind::Http,
            url: None,
            ..Default::default()
        };
        assert!(build_detector(&config).is_err());

        let config = DetectorConfig {
            kind: DetectorKind::Http,
            url: Some("http://localhost:8000/predict".into()),
            ..Default::default()
        };
        assert_eq!(build_detector(&config).unwrap().name(), "http");
    }

    #[test]
    fn local_pipeline_builds_with_defaults() {
        let mut config = MedBuddyConfig::default();
        config.model.provider = ProviderKind::Ollama;
        let pipeline = build_pipeline(&config).unwrap();
        assert_eq!(pipeline.detector_name(), "full_frame");
        assert_eq!(pipeline.provider_name(), "ollama");
    }
}
