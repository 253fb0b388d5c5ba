use std::path::PathBuf;

use thiserror::Error;

use crate::env::MissingEnvVarError;
use crate::validation::ConfigValidationError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config YAML at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVarError),

    #[error("config does not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("invalid environment override {name}={value:?}")]
    Override { name: String, value: String },

    #[error("{} config error(s): {}", .0.len(), join(.0))]
    Invalid(Vec<ConfigValidationError>),
}

fn join(errors: &[ConfigValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
