//! Structured Logger
//!
//! Wraps `tracing` to provide console output, an optional rolling NDJSON file,
//! and environment-based level control.

use std::path::PathBuf;

use anyhow::Result;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Logger settings, usually taken from the `logging` config section.
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for daily-rotated `medbuddy.log.YYYY-MM-DD` NDJSON files.
    pub log_dir: Option<PathBuf>,
    /// Emit console lines as JSON instead of the human format.
    pub json_console: bool,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            json_console: false,
        }
    }
}

/// Initialize the global structured logger.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_logger(options: &LoggerOptions) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&options.level));

    let console_layer = if options.json_console {
        fmt::layer().json().with_writer(std::io::stdout).boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
            .with_ansi(true)
            .boxed()
    };

    let file_layer = match &options.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "medbuddy.log");
            Some(
                fmt::layer()
                    .json()
                    .with_writer(appender)
                    .with_ansi(false)
                    .boxed(),
            )
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    Ok(())
}
