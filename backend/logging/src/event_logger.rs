//! Pipeline Event Logger
//!
//! Structured milestones of one processed upload, emitted on the
//! `pipeline_events` tracing target so they land in the NDJSON file.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::loggable_reply;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    RegionsDetected {
        detector: String,
        count: usize,
    },
    RegionSkipped {
        region: usize,
        reason: String,
    },
    ScheduleAccepted {
        region: usize,
        artifact: String,
    },
    ScheduleRejected {
        region: usize,
        reason: String,
        reply: Option<String>,
    },
    FallbackReturned {
        regions: usize,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub upload: String,
    pub timestamp: DateTime<Utc>,
    pub event: PipelineEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Emit a pipeline event for the given upload, redacting any model reply.
    pub fn log_event(upload: &str, mut event: PipelineEvent) {
        if let PipelineEvent::ScheduleRejected { reply: Some(reply), .. } = &mut event {
            *reply = loggable_reply(reply);
        }

        let entry = EventLogEntry {
            upload: upload.into(),
            timestamp: Utc::now(),
            event,
        };

        match serde_json::to_string(&entry) {
            Ok(json) => info!(target: "pipeline_events", event = %json, "Pipeline event"),
            Err(_) => info!(target: "pipeline_events", event = ?entry, "Pipeline event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(PipelineEvent::FallbackReturned { regions: 0 }).unwrap();
        assert_eq!(json["type"], "fallback_returned");
        assert_eq!(json["regions"], 0);
    }
}
