pub mod error;
pub mod region;
pub mod traits;
pub mod types;

pub use error::MedError;
pub use region::{PixelPoint, PixelRect, StickerRegion};
pub use traits::{StickerDetector, VisionProvider, VisionRequest, VisionResponse};
pub use types::{
    DetectionStatus, MealRelation, MedicationSchedule, ScheduleEntry, TimeOfDay,
    MAX_PILLS_PER_DOSE,
};
