//! Turning model replies into medication schedules.
//!
//! [`extract`] recovers a JSON object from free text, [`schema`] checks it,
//! [`StickerReader`] drives one model call per sticker and
//! [`SchedulePipeline`] aggregates all regions of an upload.

pub mod extract;
pub mod pipeline;
pub mod prompt;
pub mod schema;
pub mod sticker;

pub use extract::extract;
pub use pipeline::SchedulePipeline;
pub use prompt::{system_prompt, USER_PROMPT};
pub use schema::{check, parse_schedule, validate, SchemaViolation};
pub use sticker::{ReadFailure, StickerReader};

#[cfg(test)]
mod tests {
    use super::*;
    use medbuddy_core::{MealRelation, MedicationSchedule};

    #[test]
    fn serialized_records_survive_extract_and_validate() {
        for relation in MealRelation::ALL {
            for pills in 0..=medbuddy_core::MAX_PILLS_PER_DOSE {
                let record = MedicationSchedule::from_counts(pills, 0, pills, relation);
                let text = serde_json::to_string_pretty(&record).unwrap();
                let extracted = extract(&text).unwrap();
                assert!(validate(&extracted));
                assert_eq!(parse_schedule(&extracted).unwrap(), record);
            }
        }
    }
}
