//! Telemetry and structured logging for MedBuddy.
//!
//! Handles log redaction, console/NDJSON output, and pipeline event logging.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogEntry, EventLogger, PipelineEvent};
pub use logger::{init_logger, LoggerOptions};
pub use redact::{loggable_reply, redact_sensitive_data};
