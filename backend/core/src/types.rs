use std::fmt;

use serde::{Deserialize, Serialize};

/// Highest pill count accepted for a single time of day.
pub const MAX_PILLS_PER_DOSE: u8 = 4;

/// Time of day a dose is taken. Stickers always list these three rows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Noon,
    Evening,
}

impl TimeOfDay {
    /// All times in the order the sticker prints them.
    pub const ALL: [TimeOfDay; 3] = [TimeOfDay::Morning, TimeOfDay::Noon, TimeOfDay::Evening];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Noon => "noon",
            TimeOfDay::Evening => "evening",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the medication is taken before, after, or around meals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MealRelation {
    #[default]
    Before,
    After,
    BeforeAndAfter,
}

impl MealRelation {
    pub const ALL: [MealRelation; 3] = [
        MealRelation::Before,
        MealRelation::After,
        MealRelation::BeforeAndAfter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealRelation::Before => "before",
            MealRelation::After => "after",
            MealRelation::BeforeAndAfter => "before_and_after",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

impl fmt::Display for MealRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker attached only to the synthetic fallback record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStatus {
    NoScheduleDetected,
}

/// One row of the pill-count section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub time: TimeOfDay,
    pub pills: u8,
}

impl ScheduleEntry {
    pub fn new(time: TimeOfDay, pills: u8) -> Self {
        Self { time, pills }
    }
}

/// A medication schedule read from one sticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicationSchedule {
    pub schedule: Vec<ScheduleEntry>,
    pub meal_relation: MealRelation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_status: Option<DetectionStatus>,
}

impl MedicationSchedule {
    /// Build a model-derived schedule from morning/noon/evening counts.
    pub fn from_counts(morning: u8, noon: u8, evening: u8, meal_relation: MealRelation) -> Self {
        Self {
            schedule: vec![
                ScheduleEntry::new(TimeOfDay::Morning, morning),
                ScheduleEntry::new(TimeOfDay::Noon, noon),
                ScheduleEntry::new(TimeOfDay::Evening, evening),
            ],
            meal_relation,
            detection_status: None,
        }
    }

    /// The record returned when no sticker region produced a valid schedule.
    pub fn fallback() -> Self {
        Self {
            detection_status: Some(DetectionStatus::NoScheduleDetected),
            ..Self::from_counts(0, 0, 0, MealRelation::Before)
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.detection_status == Some(DetectionStatus::NoScheduleDetected)
    }

    /// Pill count for a time of day (first matching entry).
    pub fn pills_at(&self, time: TimeOfDay) -> Option<u8> {
        self.schedule.iter().find(|e| e.time == time).map(|e| e.pills)
    }
}
