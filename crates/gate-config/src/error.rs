//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration document could not be parsed
    #[error("Failed to parse {format} config: {message}")]
    Parse {
        /// Document format (yaml, toml)
        format: &'static str,
        /// Parser message
        message: String,
    },

    /// The file extension does not name a supported format
    #[error("Unsupported config format: {path}")]
    UnsupportedFormat {
        /// Offending file
        path: PathBuf,
    },

    /// An environment override could not be interpreted
    #[error("Invalid value for {variable}: {message}")]
    Environment {
        /// Environment variable name
        variable: String,
        /// What was wrong with the value
        message: String,
    },

    /// A configuration value is out of range
    #[error("Invalid configuration for {field}: {message}")]
    Invalid {
        /// Dotted path of the field
        field: String,
        /// Validation message
        message: String,
    },
}

impl ConfigError {
    /// Creates a parse error.
    pub fn parse(format: &'static str, error: impl std::fmt::Display) -> Self {
        Self::Parse {
            format,
            message: error.to_string(),
        }
    }

    /// Creates an environment override error.
    pub fn environment(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Environment {
            variable: variable.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable code
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "config_io_error",
            Self::Parse { .. } => "config_parse_error",
            Self::UnsupportedFormat { .. } => "config_unsupported_format",
            Self::Environment { .. } => "config_environment_error",
            Self::Invalid { .. } => "config_invalid",
        }
    }
}
