//! # Gate Config
//!
//! Configuration for the prompt optimization gate.
//!
//! Configuration is layered:
//! 1. Built-in defaults
//! 2. An optional YAML or TOML file named by `PROMPT_GATE_CONFIG`
//! 3. `PROMPT_GATE_*` environment overrides
//!
//! The result is validated before it is handed out.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigError, ConfigResult};
pub use loader::{apply_env_overrides, load_config, load_config_from_path, CONFIG_PATH_ENV};

/// Top-level gate configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Orchestrator settings
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Audit trail settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging and tracing settings
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl GateConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(source).map_err(|e| ConfigError::parse("yaml", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::parse("toml", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(timeout) = self.orchestrator.stage_timeout {
            if timeout.is_zero() {
                return Err(ConfigError::invalid(
                    "orchestrator.stage_timeout",
                    "stage timeout must be greater than zero",
                ));
            }
        }

        if self.audit.capacity == 0 {
            return Err(ConfigError::invalid(
                "audit.capacity",
                "audit capacity must be greater than 0",
            ));
        }

        if self.audit.history_limit == 0 {
            return Err(ConfigError::invalid(
                "audit.history_limit",
                "history limit must be greater than 0",
            ));
        }

        if !(0.0..=1.0).contains(&self.telemetry.sampling_rate) {
            return Err(ConfigError::invalid(
                "telemetry.sampling_rate",
                format!(
                    "sampling rate must be between 0.0 and 1.0, got {}",
                    self.telemetry.sampling_rate
                ),
            ));
        }

        Ok(())
    }
}

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Upper bound for each capability call. `None` means latency is only
    /// measured, never bounded.
    #[serde(default, with = "humantime_serde")]
    pub stage_timeout: Option<Duration>,

    /// Prefix attached to gate log events
    #[serde(default = "default_log_prefix")]
    pub log_prefix: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            stage_timeout: None,
            log_prefix: default_log_prefix(),
        }
    }
}

impl OrchestratorConfig {
    /// Bound every capability call by `timeout`
    #[must_use]
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }
}

/// Audit trail settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether decisions are recorded
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum records kept by the in-memory store
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Emit every record as a structured log event
    #[serde(default = "default_true")]
    pub log_to_stdout: bool,

    /// Include query and prompt text in log events
    #[serde(default)]
    pub include_prompts: bool,

    /// Default number of records returned by history queries
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: default_capacity(),
            log_to_stdout: true,
            include_prompts: false,
            history_limit: default_history_limit(),
        }
    }
}

/// Logging and tracing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to traces
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Deployment environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Log filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub json_logs: bool,

    /// OTLP collector endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otlp_endpoint: Option<String>,

    /// Trace sampling rate (0.0 - 1.0)
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            environment: default_environment(),
            log_level: default_log_level(),
            json_logs: false,
            otlp_endpoint: None,
            sampling_rate: default_sampling_rate(),
        }
    }
}

fn default_log_prefix() -> String {
    "gate".to_string()
}

fn default_true() -> bool {
    true
}

fn default_capacity() -> usize {
    1000
}

fn default_history_limit() -> usize {
    50
}

fn default_service_name() -> String {
    "prompt-gate".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sampling_rate() -> f64 {
    1.0
}
