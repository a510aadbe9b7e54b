//! Strict shape check for extracted schedules.

use medbuddy_core::{MealRelation, MedicationSchedule, ScheduleEntry, TimeOfDay, MAX_PILLS_PER_DOSE};
use serde_json::Value;
use thiserror::Error;

/// The first rule a candidate object broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("reply is not a JSON object")]
    NotAnObject,
    #[error("missing key `{0}`")]
    MissingKey(&'static str),
    #[error("`schedule` must be a list of exactly 3 entries, got {0}")]
    ScheduleLength(String),
    #[error("schedule entry {index} is not an object")]
    EntryNotAnObject { index: usize },
    #[error("schedule entry {index} is missing `{key}`")]
    EntryMissingKey { index: usize, key: &'static str },
    #[error("schedule entry {index} has unknown time {value}")]
    UnknownTime { index: usize, value: String },
    #[error("schedule entry {index} has pills {value}, expected an integer in 0..={max}")]
    PillsOutOfRange { index: usize, value: String, max: u8 },
    #[error("unknown meal_relation {0}")]
    UnknownMealRelation(String),
}

/// Check `candidate` against the schedule schema and convert it.
///
/// Keys other than `schedule` and `meal_relation` are ignored, so the result
/// never carries a detection status.
pub fn parse_schedule(candidate: &Value) -> Result<MedicationSchedule, SchemaViolation> {
    let object = candidate.as_object().ok_or(SchemaViolation::NotAnObject)?;
    let schedule = object
        .get("schedule")
        .ok_or(SchemaViolation::MissingKey("schedule"))?;
    let meal_relation = object
        .get("meal_relation")
        .ok_or(SchemaViolation::MissingKey("meal_relation"))?;

    let entries = match schedule.as_array() {
        Some(entries) if entries.len() == 3 => entries,
        Some(entries) => return Err(SchemaViolation::ScheduleLength(entries.len().to_string())),
        None => return Err(SchemaViolation::ScheduleLength(schedule.to_string())),
    };

    let schedule = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_entry(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    let meal_relation = meal_relation
        .as_str()
        .and_then(MealRelation::parse)
        .ok_or_else(|| SchemaViolation::UnknownMealRelation(meal_relation.to_string()))?;

    Ok(MedicationSchedule {
        schedule,
        meal_relation,
        detection_status: None,
    })
}

fn parse_entry(index: usize, entry: &Value) -> Result<ScheduleEntry, SchemaViolation> {
    let entry = entry
        .as_object()
        .ok_or(SchemaViolation::EntryNotAnObject { index })?;
    let time = entry
        .get("time")
        .ok_or(SchemaViolation::EntryMissingKey { index, key: "time" })?;
    let pills = entry
        .get("pills")
        .ok_or(SchemaViolation::EntryMissingKey { index, key: "pills" })?;

    let time = time
        .as_str()
        .and_then(TimeOfDay::parse)
        .ok_or_else(|| SchemaViolation::UnknownTime {
            index,
            value: time.to_string(),
        })?;

    // `as_u64` is `None` for floats, negatives, strings and booleans.
    // The JSON integer `-0` parses as a negative-zero float and counts as 0.
    let pills = pills
        .as_u64()
        .or_else(|| is_negative_zero(pills).then_some(0))
        .filter(|&n| n <= u64::from(MAX_PILLS_PER_DOSE))
        .map(|n| n as u8)
        .ok_or_else(|| SchemaViolation::PillsOutOfRange {
            index,
            value: pills.to_string(),
            max: MAX_PILLS_PER_DOSE,
        })?;

    Ok(ScheduleEntry::new(time, pills))
}

fn is_negative_zero(value: &Value) -> bool {
    value.is_f64() && value.as_f64().is_some_and(|f| f == 0.0 && f.is_sign_negative())
}

/// Detailed validation, for logging.
pub fn check(candidate: &Value) -> Result<(), SchemaViolation> {
    parse_schedule(candidate).map(|_| ())
}

/// True when `candidate` is a well-formed medication schedule.
pub fn validate(candidate: &Value) -> bool {
    check(candidate).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "schedule": [
                {"time": "morning", "pills": 1},
                {"time": "noon", "pills": 0},
                {"time": "evening", "pills": 4}
            ],
            "meal_relation": "before_and_after"
        })
    }

    #[test]
    fn accepts_well_formed_schedule() {
        assert!(validate(&valid()));
        let parsed = parse_schedule(&valid()).unwrap();
        assert_eq!(parsed, MedicationSchedule::from_counts(1, 0, 4, MealRelation::BeforeAndAfter));
    }

    #[test]
    fn rejects_wrong_entry_count() {
        let mut v = valid();
        v["schedule"]
            .as_array_mut()
            .unwrap()
            .push(json!({"time": "noon", "pills": 1}));
        assert_eq!(check(&v), Err(SchemaViolation::ScheduleLength("4".into())));

        v["schedule"] = json!([]);
        assert!(!validate(&v));
    }

    #[test]
    fn rejects_non_integer_pills() {
        for bad in [json!(1.5), json!(2.0), json!("2"), json!(true), json!(null), json!(-1)] {
            let mut v = valid();
            v["schedule"][0]["pills"] = bad.clone();
            assert!(!validate(&v), "pills {bad} should be rejected");
        }
    }

    #[test]
    fn negative_zero_pills_count_as_zero() {
        let raw = r#"{"schedule":[{"time":"morning","pills":-0},{"time":"noon","pills":1},{"time":"evening","pills":0}],"meal_relation":"after"}"#;
        let v: Value = serde_json::from_str(raw).unwrap();
        let schedule = parse_schedule(&v).unwrap();
        assert_eq!(schedule.pills_at(TimeOfDay::Morning), Some(0));

        let mut v = valid();
        v["schedule"][0]["pills"] = json!(0.0);
        assert!(!validate(&v));
    }

    #[test]
    fn rejects_pills_above_bound() {
        let mut v = valid();
        v["schedule"][2]["pills"] = json!(5);
        assert!(matches!(check(&v), Err(SchemaViolation::PillsOutOfRange { index: 2, .. })));
    }

    #[test]
    fn rejects_unknown_time_without_case_folding() {
        let mut v = valid();
        v["schedule"][1]["time"] = json!("Noon");
        assert!(matches!(check(&v), Err(SchemaViolation::UnknownTime { index: 1, .. })));

        v["schedule"][1]["time"] = json!("night");
        assert!(!validate(&v));
    }

    #[test]
    fn duplicate_times_are_accepted() {
        let mut v = valid();
        v["schedule"][1]["time"] = json!("morning");
        assert!(validate(&v));
    }

    #[test]
    fn rejects_unknown_meal_relation() {
        let mut v = valid();
        v["meal_relation"] = json!("with_meal");
        assert!(matches!(check(&v), Err(SchemaViolation::UnknownMealRelation(_))));
    }

    #[test]
    fn rejects_missing_keys_and_non_objects() {
        assert_eq!(check(&json!([1, 2, 3])), Err(SchemaViolation::NotAnObject));
        assert_eq!(
            check(&json!({"schedule": []})),
            Err(SchemaViolation::MissingKey("meal_relation"))
        );

        let mut v = valid();
        v["schedule"][0] = json!({"time": "morning"});
        assert_eq!(
            check(&v),
            Err(SchemaViolation::EntryMissingKey { index: 0, key: "pills" })
        );
    }

    #[test]
    fn extra_keys_are_dropped() {
        let mut v = valid();
        v["detection_status"] = json!("no_schedule_detected");
        v["note"] = json!("extra");
        assert_eq!(parse_schedule(&v).unwrap().detection_status, None);
    }
}
