//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Configuration file not found; searched: {searched:?}")]
    ConfigFileNotFound { searched: Vec<PathBuf> },

    #[error("Failed to read configuration file {path}: {message}")]
    FileRead { path: String, message: String },

    #[error("Invalid YAML in {path}: {message}")]
    InvalidYaml { path: String, message: String },

    #[error("Invalid value for {field}: {value:?} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingRequired { field: String },
}

impl ConfigurationError {
    pub fn config_file_not_found(searched: Vec<PathBuf>) -> Self {
        Self::ConfigFileNotFound { searched }
    }

    pub fn file_read_error(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn invalid_yaml(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::InvalidYaml {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_required(field: impl Into<String>) -> Self {
        Self::MissingRequired {
            field: field.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
