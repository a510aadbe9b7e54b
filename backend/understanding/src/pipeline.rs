//! Detection → crop → read → aggregate, for one uploaded photo.

use std::sync::Arc;

use image::DynamicImage;
use medbuddy_core::{MedError, MedicationSchedule, StickerDetector};
use medbuddy_logging::{EventLogger, PipelineEvent};
use medbuddy_media::{crop_to_png, ArtifactStore};
use tracing::{info, warn};

use crate::sticker::StickerReader;

/// Runs every detected sticker region through the reader and keeps the
/// last schedule that validated.
pub struct SchedulePipeline {
    detector: Arc<dyn StickerDetector>,
    reader: StickerReader,
    store: ArtifactStore,
}

impl SchedulePipeline {
    pub fn new(detector: Arc<dyn StickerDetector>, reader: StickerReader, store: ArtifactStore) -> Self {
        Self {
            detector,
            reader,
            store,
        }
    }

    pub fn detector_name(&self) -> &str {
        self.detector.name()
    }

    pub fn provider_name(&self) -> &str {
        self.reader.provider_name()
    }

    /// Process one decoded photo. `upload` labels the pipeline events.
    ///
    /// Model and parsing failures only drop the affected region; detector
    /// and artifact I/O failures abort the run. Cropping and encoding run on
    /// the blocking pool.
    pub async fn run(&self, image: Arc<DynamicImage>, upload: &str) -> Result<MedicationSchedule, MedError> {
        self.store.ensure_dirs().await.map_err(storage_error)?;

        let regions = self
            .detector
            .detect(&image)
            .await
            .map_err(|e| MedError::Detection {
                detector: self.detector.name().to_string(),
                message: format!("{e:#}"),
            })?;

        info!(detector = self.detector.name(), count = regions.len(), "Sticker regions detected");
        EventLogger::log_event(
            upload,
            PipelineEvent::RegionsDetected {
                detector: self.detector.name().to_string(),
                count: regions.len(),
            },
        );

        let mut current: Option<MedicationSchedule> = None;

        for (offset, region) in regions.iter().enumerate() {
            let index = offset + 1;

            let Some(png) = crop_to_png(Arc::clone(&image), region.clone()).await? else {
                warn!(region = index, "Skipping degenerate sticker region");
                EventLogger::log_event(
                    upload,
                    PipelineEvent::RegionSkipped {
                        region: index,
                        reason: "polygon has no area inside the image".to_string(),
                    },
                );
                continue;
            };

            self.store.write_sticker(index, &png).await.map_err(storage_error)?;

            match self.reader.try_read(&png).await {
                Ok(schedule) => {
                    let artifact = self
                        .store
                        .write_result(index, &schedule)
                        .await
                        .map_err(storage_error)?;
                    info!(region = index, "Sticker schedule accepted");
                    EventLogger::log_event(
                        upload,
                        PipelineEvent::ScheduleAccepted {
                            region: index,
                            artifact: artifact.display().to_string(),
                        },
                    );
                    current = Some(schedule);
                }
                Err(failure) => {
                    warn!(region = index, reason = %failure.reason(), "Sticker produced no schedule");
                    EventLogger::log_event(
                        upload,
                        PipelineEvent::ScheduleRejected {
                            region: index,
                            reason: failure.reason(),
                            reply: failure.reply().map(str::to_string),
                        },
                    );
                }
            }
        }

        Ok(current.unwrap_or_else(|| {
            EventLogger::log_event(
                upload,
                PipelineEvent::FallbackReturned {
                    regions: regions.len(),
                },
            );
            MedicationSchedule::fallback()
        }))
    }
}

fn storage_error(e: anyhow::Error) -> MedError {
    MedError::Storage(format!("{e:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{Rgb, RgbImage};
    use medbuddy_core::{MealRelation, PixelPoint, StickerRegion};
    use medbuddy_providers::MockProvider;

    const MORNING_ONLY: &str = r#"{"schedule":[{"time":"morning","pills":1},{"time":"noon","pills":0},{"time":"evening","pills":0}],"meal_relation":"before"}"#;
    const TWICE_DAILY: &str = r#"{"schedule":[{"time":"morning","pills":2},{"time":"noon","pills":0},{"time":"evening","pills":2}],"meal_relation":"after"}"#;

    struct FixedDetector(Vec<StickerRegion>);

    #[async_trait]
    impl StickerDetector for FixedDetector {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<StickerRegion>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenDetector;

    #[async_trait]
    impl StickerDetector for BrokenDetector {
        fn name(&self) -> &str {
            "broken"
        }

        async fn detect(&self, _image: &DynamicImage) -> anyhow::Result<Vec<StickerRegion>> {
            anyhow::bail!("model weights missing")
        }
    }

    fn photo() -> Arc<DynamicImage> {
        Arc::new(DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, Rgb([200, 200, 200]))))
    }

    fn square(x: f32, y: f32) -> StickerRegion {
        StickerRegion::new(
            vec![
                PixelPoint::new(x, y),
                PixelPoint::new(x + 10.0, y),
                PixelPoint::new(x + 10.0, y + 10.0),
                PixelPoint::new(x, y + 10.0),
            ],
            0.9,
        )
    }

    fn pipeline(
        dir: &tempfile::TempDir,
        detector: impl StickerDetector + 'static,
        provider: MockProvider,
    ) -> SchedulePipeline {
        let store = ArtifactStore::new(dir.path().join("stickers"), dir.path().join("results"));
        SchedulePipeline::new(
            Arc::new(detector),
            StickerReader::new(Arc::new(provider), "m"),
            store,
        )
    }

    #[tokio::test]
    async fn zero_regions_return_exact_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(&dir, FixedDetector(vec![]), MockProvider::new("mock"));

        let result = p.run(photo(), "empty.png").await.unwrap();
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"schedule":[{"time":"morning","pills":0},{"time":"noon","pills":0},{"time":"evening","pills":0}],"meal_relation":"before","detection_status":"no_schedule_detected"}"#
        );
    }

    #[tokio::test]
    async fn later_failure_keeps_earlier_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::new("mock")
            .then_reply(MORNING_ONLY)
            .then_fail("connection reset");
        let p = pipeline(&dir, FixedDetector(vec![square(0.0, 0.0), square(20.0, 20.0)]), provider);

        let result = p.run(photo(), "two.png").await.unwrap();
        assert_eq!(result, MedicationSchedule::from_counts(1, 0, 0, MealRelation::Before));

        assert!(dir.path().join("stickers/sticker_1.png").exists());
        assert!(dir.path().join("stickers/sticker_2.png").exists());
        assert!(dir.path().join("results/result_1.json").exists());
        assert!(!dir.path().join("results/result_2.json").exists());
    }

    #[tokio::test]
    async fn last_valid_region_wins() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::new("mock")
            .then_reply(MORNING_ONLY)
            .then_reply(format!("Here you go:\n```json\n{TWICE_DAILY}\n```"));
        let p = pipeline(&dir, FixedDetector(vec![square(0.0, 0.0), square(20.0, 20.0)]), provider);

        let result = p.run(photo(), "two.png").await.unwrap();
        assert_eq!(result, MedicationSchedule::from_counts(2, 0, 2, MealRelation::After));

        let saved = std::fs::read_to_string(dir.path().join("results/result_1.json")).unwrap();
        assert!(saved.contains("\"pills\": 1"));
    }

    #[tokio::test]
    async fn invalid_replies_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let provider = MockProvider::new("mock").with_response("no JSON here");
        let p = pipeline(&dir, FixedDetector(vec![square(5.0, 5.0)]), provider);

        let result = p.run(photo(), "one.png").await.unwrap();
        assert!(result.is_fallback());
    }

    #[tokio::test]
    async fn degenerate_region_is_skipped_without_model_call() {
        let dir = tempfile::tempdir().unwrap();
        let line = StickerRegion::new(vec![PixelPoint::new(1.0, 1.0), PixelPoint::new(9.0, 9.0)], 0.9);
        let provider = Arc::new(MockProvider::new("mock").with_response(MORNING_ONLY));
        let store = ArtifactStore::new(dir.path().join("stickers"), dir.path().join("results"));
        let p = SchedulePipeline::new(
            Arc::new(FixedDetector(vec![line])),
            StickerReader::new(provider.clone(), "m"),
            store,
        );

        let result = p.run(photo(), "line.png").await.unwrap();
        assert!(result.is_fallback());
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn detector_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = pipeline(&dir, BrokenDetector, MockProvider::new("mock"));

        let err = p.run(photo(), "x.png").await.unwrap_err();
        assert!(matches!(err, MedError::Detection { ref detector, .. } if detector == "broken"));
    }

    #[tokio::test]
    async fn unwritable_results_dir_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("results"), b"not a directory").unwrap();
        let provider = MockProvider::new("mock").with_response(MORNING_ONLY);
        let p = pipeline(&dir, FixedDetector(vec![square(0.0, 0.0)]), provider);

        let err = p.run(photo(), "x.png").await.unwrap_err();
        assert!(matches!(err, MedError::Storage(_)));
        assert!(err.to_string().starts_with("storage error: "));
    }
}
