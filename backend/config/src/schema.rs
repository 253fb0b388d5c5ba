//! Typed application configuration.

use std::path::PathBuf;
use std::time::Duration;

use codebuddy_core::Provider;
use serde::{Deserialize, Serialize};

/// Root config, read from `config.yaml`. Every field has a default, so an
/// empty or missing file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Seconds between screen captures.
    pub capture_interval_secs: u64,
    pub vision_model: String,
    pub qa_model: String,
    pub vision_max_tokens: u32,
    /// `None` leaves the choice to the provider's default.
    pub qa_max_tokens: Option<u32>,
    pub request_timeout_secs: u64,
    /// Relative paths resolve against the working directory.
    pub sessions_dir: PathBuf,
    pub skip_own_window: bool,
    pub continue_previous: bool,
    pub max_image_width: u32,
    pub max_image_height: u32,
    pub custom_providers: Vec<Provider>,
    pub allow_model_shadowing: bool,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            capture_interval_secs: 15,
            vision_model: "gpt-4o-mini".to_string(),
            qa_model: "gpt-4o".to_string(),
            vision_max_tokens: 500,
            qa_max_tokens: None,
            request_timeout_secs: 60,
            sessions_dir: PathBuf::from("sessions"),
            skip_own_window: true,
            continue_previous: false,
            max_image_width: 2000,
            max_image_height: 768,
            custom_providers: Vec::new(),
            allow_model_shadowing: false,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn capture_interval(&self) -> Duration {
        Duration::from_secs(self.capture_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
