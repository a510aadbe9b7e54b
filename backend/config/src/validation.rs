//! Config validation: deep checks with user-friendly error messages.

use std::net::IpAddr;

use crate::schema::{DetectorKind, MedBuddyConfig};
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &MedBuddyConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_model(config, &mut report);
    validate_detector(config, &mut report);
    validate_storage(config, &mut report);
    report
}

fn validate_server(config: &MedBuddyConfig, report: &mut ValidationReport) {
    let server = &config.server;
    if server.bind_address.parse::<IpAddr>().is_err() {
        report.error(
            "server.bindAddress",
            format!("'{}' is not an IP address", server.bind_address),
        );
    }
    if server.port < 1024 && server.port != 80 && server.port != 443 {
        report.warn(
            "server.port",
            format!("Port {} requires elevated privileges; consider using a port >= 1024", server.port),
        );
    }
    if server.max_upload_bytes == 0 {
        report.error("server.maxUploadBytes", "must be > 0");
    }
    if server.allowed_extensions.is_empty() {
        report.error("server.allowedExtensions", "at least one extension is required");
    }
    for ext in &server.allowed_extensions {
        if ext.starts_with('.') || ext.chars().any(|c| c.is_ascii_uppercase()) {
            report.error(
                "server.allowedExtensions",
                format!("'{ext}' must be lower-case and without a leading dot"),
            );
        }
    }
    if server.upload_dir.as_os_str().is_empty() {
        report.error("server.uploadDir", "cannot be empty");
    }
}

fn validate_model(config: &MedBuddyConfig, report: &mut ValidationReport) {
    let model = &config.model;
    if model.model.trim().is_empty() {
        report.error("model.model", "Model id cannot be empty");
    }
    if model.provider.requires_api_key()
        && model.api_key.as_deref().map(str::is_empty).unwrap_or(true)
    {
        report.error(
            "model.apiKey",
            format!("Provider '{}' requires an API key", model.provider.as_str()),
        );
    }
    if !(0.0..=2.0).contains(&model.temperature) {
        report.error("model.temperature", "must be between 0.0 and 2.0");
    }
    if model.max_tokens == 0 {
        report.error("model.maxTokens", "must be > 0");
    }
    if let Some(url) = &model.base_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            report.error("model.baseUrl", "must be an http(s) URL");
        }
    }
}

fn validate_detector(config: &MedBuddyConfig, report: &mut ValidationReport) {
    let detector = &config.detector;
    if !(0.0..=1.0).contains(&detector.min_confidence) {
        report.error("detector.minConfidence", "must be between 0.0 and 1.0");
    }
    match detector.kind {
        DetectorKind::Http => match &detector.url {
            None => report.error("detector.url", "HTTP detector requires a URL"),
            Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                report.error("detector.url", "must be an http(s) URL")
            }
            Some(_) => {}
        },
        DetectorKind::FullFrame => {
            if detector.url.is_some() {
                report.warn("detector.url", "Ignored by the full_frame detector");
            }
        }
    }
}

fn validate_storage(config: &MedBuddyConfig, report: &mut ValidationReport) {
    let storage = &config.storage;
    if storage.stickers_dir.as_os_str().is_empty() {
        report.error("storage.stickersDir", "cannot be empty");
    }
    if storage.results_dir.as_os_str().is_empty() {
        report.error("storage.resultsDir", "cannot be empty");
    }
}
