//! Error types for the gate.
//!
//! Capability failures never reach the caller of the orchestrator: every
//! [`CapabilityError`] is turned into the fallback path. [`GateError`] only
//! covers construction-time problems (invalid requests, incomplete wiring).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for capability calls.
pub type CapabilityResult<T> = Result<T, CapabilityError>;

/// Errors surfaced by an external capability (Optimizer, Judge, agent
/// configuration lookup, audit sink).
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapabilityError {
    /// The call did not complete within the configured stage timeout.
    #[error("{capability} timed out after {timeout_ms}ms")]
    Timeout {
        /// Capability that timed out.
        capability: String,
        /// Timeout that was exceeded, in milliseconds.
        timeout_ms: u64,
    },

    /// The calling context was cancelled while the call was outstanding.
    #[error("{capability} call cancelled")]
    Cancelled {
        /// Capability whose call was cancelled.
        capability: String,
    },

    /// The capability could not be reached or returned a transport-level error.
    #[error("{capability} transport error: {message}")]
    Transport {
        /// Capability that failed.
        capability: String,
        /// Description of the failure.
        message: String,
    },

    /// The capability answered, but its output could not be parsed.
    #[error("{capability} returned malformed output: {message}")]
    MalformedOutput {
        /// Capability that produced the output.
        capability: String,
        /// Parser error.
        message: String,
    },

    /// The output parsed but did not satisfy its schema.
    #[error("{capability} output failed schema validation: {message}")]
    SchemaValidation {
        /// Capability that produced the output.
        capability: String,
        /// Validation failure details.
        message: String,
    },

    /// The capability is disabled or otherwise unavailable.
    #[error("{capability} unavailable: {message}")]
    Unavailable {
        /// Capability that is unavailable.
        capability: String,
        /// Reason for unavailability.
        message: String,
    },

    /// Unexpected internal failure.
    #[error("{capability} internal error: {message}")]
    Internal {
        /// Capability that failed.
        capability: String,
        /// Description of the failure.
        message: String,
    },
}

impl CapabilityError {
    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(capability: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            capability: capability.into(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Creates a cancellation error.
    #[must_use]
    pub fn cancelled(capability: impl Into<String>) -> Self {
        Self::Cancelled {
            capability: capability.into(),
        }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// Creates a malformed-output error.
    #[must_use]
    pub fn malformed(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedOutput {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// Creates a schema validation error.
    #[must_use]
    pub fn schema(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaValidation {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// Name of the capability that produced this error.
    #[must_use]
    pub fn capability(&self) -> &str {
        match self {
            Self::Timeout { capability, .. }
            | Self::Cancelled { capability }
            | Self::Transport { capability, .. }
            | Self::MalformedOutput { capability, .. }
            | Self::SchemaValidation { capability, .. }
            | Self::Unavailable { capability, .. }
            | Self::Internal { capability, .. } => capability,
        }
    }

    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "CAPABILITY_TIMEOUT",
            Self::Cancelled { .. } => "CAPABILITY_CANCELLED",
            Self::Transport { .. } => "CAPABILITY_TRANSPORT",
            Self::MalformedOutput { .. } => "MALFORMED_OUTPUT",
            Self::SchemaValidation { .. } => "SCHEMA_VALIDATION",
            Self::Unavailable { .. } => "CAPABILITY_UNAVAILABLE",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether the failure was a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether the failure was a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Construction-time errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    /// A request failed validation.
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
        /// Field that failed validation (if applicable).
        field: Option<String>,
    },

    /// The gate was wired incorrectly.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl GateError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
        }
    }
}
