//! Environment variables that override individual config fields.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::debug;

use crate::error::ConfigError;
use crate::schema::AppConfig;

pub const ENV_INTERVAL: &str = "CODEBUDDY_INTERVAL";
pub const ENV_VISION_MODEL: &str = "CODEBUDDY_VISION_MODEL";
pub const ENV_QA_MODEL: &str = "CODEBUDDY_QA_MODEL";
pub const ENV_SESSIONS_DIR: &str = "CODEBUDDY_SESSIONS_DIR";
/// `DEBUG=TRUE` keeps capturing while the launching terminal has focus.
pub const ENV_DEBUG: &str = "DEBUG";

/// Apply overrides from `env`. Empty values are ignored.
pub fn apply_env_overrides(
    mut config: AppConfig,
    env: &HashMap<String, String>,
) -> Result<AppConfig, ConfigError> {
    let get = |name: &str| env.get(name).filter(|v| !v.is_empty());

    if let Some(raw) = get(ENV_INTERVAL) {
        config.capture_interval_secs = raw.trim().parse().map_err(|_| ConfigError::Override {
            name: ENV_INTERVAL.to_string(),
            value: raw.clone(),
        })?;
        debug!(secs = config.capture_interval_secs, "Capture interval overridden from env");
    }
    if let Some(model) = get(ENV_VISION_MODEL) {
        config.vision_model = model.clone();
    }
    if let Some(model) = get(ENV_QA_MODEL) {
        config.qa_model = model.clone();
    }
    if let Some(dir) = get(ENV_SESSIONS_DIR) {
        config.sessions_dir = PathBuf::from(dir);
    }
    if get(ENV_DEBUG).is_some_and(|v| v.eq_ignore_ascii_case("true")) {
        debug!("DEBUG=TRUE; own-window skipping disabled");
        config.skip_own_window = false;
    }
    Ok(config)
}
