//! Config validation with user-facing messages.

use thiserror::Error;

use crate::schema::AppConfig;

/// A validation finding with the offending field path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All findings from one pass. Errors abort startup; warnings are logged.
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

/// Longest accepted capture interval, one day.
pub const MAX_CAPTURE_INTERVAL_SECS: u64 = 86_400;

pub fn validate(config: &AppConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_capture(config, &mut report);
    validate_models(config, &mut report);
    validate_providers(config, &mut report);
    report
}

fn validate_capture(config: &AppConfig, report: &mut ValidationReport) {
    match config.capture_interval_secs {
        0 => report.error("captureIntervalSecs", "must be at least 1 second"),
        1 => report.warn(
            "captureIntervalSecs",
            "1 second captures will call the vision model very often",
        ),
        secs if secs > MAX_CAPTURE_INTERVAL_SECS => report.error(
            "captureIntervalSecs",
            format!("must be at most {MAX_CAPTURE_INTERVAL_SECS} seconds"),
        ),
        _ => {}
    }
    if config.max_image_width == 0 || config.max_image_height == 0 {
        report.error("maxImageWidth", "image bounds must be non-zero");
    }
    if config.request_timeout_secs == 0 {
        report.error("requestTimeoutSecs", "must be at least 1 second");
    }
    if config.sessions_dir.as_os_str().is_empty() {
        report.error("sessionsDir", "cannot be empty");
    }
}

fn validate_models(config: &AppConfig, report: &mut ValidationReport) {
    if config.vision_model.trim().is_empty() {
        report.error("visionModel", "model name cannot be empty");
    }
    if config.qa_model.trim().is_empty() {
        report.error("qaModel", "model name cannot be empty");
    }
    if config.vision_max_tokens == 0 {
        report.error("visionMaxTokens", "must be positive");
    }
    if config.qa_max_tokens == Some(0) {
        report.error("qaMaxTokens", "must be positive when set");
    }
}

fn validate_providers(config: &AppConfig, report: &mut ValidationReport) {
    for (i, provider) in config.custom_providers.iter().enumerate() {
        let path = format!("customProviders[{i}]");
        if provider.name.trim().is_empty() {
            report.error(format!("{path}.name"), "provider name cannot be empty");
        }
        if !provider.base_url.starts_with("http://") && !provider.base_url.starts_with("https://") {
            report.error(
                format!("{path}.baseUrl"),
                format!("'{}' is not an http(s) URL", provider.base_url),
            );
        }
        if provider.models.is_empty() {
            report.warn(format!("{path}.models"), "provider serves no models");
        }
        if provider.models.iter().any(|m| m.trim().is_empty()) {
            report.error(format!("{path}.models"), "model name cannot be empty");
        }
        if provider.response_paths.content.trim().is_empty() {
            report.warn(
                format!("{path}.responsePaths.content"),
                "empty content path selects the whole response body",
            );
        }
    }
}
