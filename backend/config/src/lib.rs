//! `codebuddy-config`: loading the CodeBuddy runtime configuration.
//!
//! Provides:
//! - Typed config schema with defaults for every field
//! - YAML reading from the config directory
//! - `${ENV_VAR}` substitution
//! - Environment overrides
//! - Validation report

pub mod env;
pub mod error;
pub mod io;
pub mod overrides;
pub mod schema;
pub mod validation;

pub use env::{resolve_env_vars_with, MissingEnvVarError};
pub use error::ConfigError;
pub use io::{config_dir, config_file_path, read_config_value};
pub use overrides::apply_env_overrides;
pub use schema::AppConfig;
pub use validation::{
    validate, ConfigValidationError, ValidationReport, MAX_CAPTURE_INTERVAL_SECS,
};

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

/// A validated config plus the non-fatal findings from validation.
///
/// Warnings are handed back rather than logged here because the config is
/// loaded before the logger exists.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub warnings: Vec<ConfigValidationError>,
}

/// Read, substitute, override and validate the config at `path` against the
/// process environment.
pub async fn load_and_prepare(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let raw = read_config_value(path).await?;
    prepare(&raw, &std::env::vars().collect())
}

/// The load pipeline minus the file read. Validation errors fail the load.
pub fn prepare(raw: &Value, env: &HashMap<String, String>) -> Result<LoadedConfig, ConfigError> {
    let value = resolve_env_vars_with(raw, env)?;
    let config: AppConfig = serde_json::from_value(value)?;
    let config = apply_env_overrides(config, env)?;

    let report = validate(&config);
    if !report.is_valid() {
        return Err(ConfigError::Invalid(report.errors));
    }
    Ok(LoadedConfig {
        config,
        warnings: report.warnings,
    })
}
