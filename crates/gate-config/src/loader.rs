//! Loading configuration from files and the environment.

use crate::error::{ConfigError, ConfigResult};
use crate::GateConfig;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "PROMPT_GATE_CONFIG";

const STAGE_TIMEOUT_ENV: &str = "PROMPT_GATE_STAGE_TIMEOUT";
const LOG_LEVEL_ENV: &str = "PROMPT_GATE_LOG_LEVEL";
const JSON_LOGS_ENV: &str = "PROMPT_GATE_JSON_LOGS";
const AUDIT_ENABLED_ENV: &str = "PROMPT_GATE_AUDIT_ENABLED";
const AUDIT_CAPACITY_ENV: &str = "PROMPT_GATE_AUDIT_CAPACITY";

/// Load configuration from defaults, the file named by `PROMPT_GATE_CONFIG`
/// (if set) and `PROMPT_GATE_*` overrides.
pub async fn load_config() -> ConfigResult<GateConfig> {
    let config = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => read_file(Path::new(path.trim())).await?,
        _ => {
            debug!("No config file set, using defaults");
            GateConfig::default()
        }
    };

    let config = apply_env_overrides(config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a specific file, then apply environment overrides.
pub async fn load_config_from_path(path: impl AsRef<Path>) -> ConfigResult<GateConfig> {
    let config = read_file(path.as_ref()).await?;
    let config = apply_env_overrides(config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

async fn read_file(path: &Path) -> ConfigResult<GateConfig> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml" | "yml") => GateConfig::from_yaml_str(&contents)?,
        Some("toml") => GateConfig::from_toml_str(&contents)?,
        _ => {
            return Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    info!(path = %path.display(), "Loaded gate configuration");
    Ok(config)
}

/// Apply `PROMPT_GATE_*` overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(mut config: GateConfig, lookup: F) -> ConfigResult<GateConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(STAGE_TIMEOUT_ENV) {
        let timeout = humantime::parse_duration(value.trim())
            .map_err(|e| ConfigError::environment(STAGE_TIMEOUT_ENV, e.to_string()))?;
        config.orchestrator.stage_timeout = Some(timeout);
    }

    if let Some(value) = lookup(LOG_LEVEL_ENV) {
        config.telemetry.log_level = value;
    }

    if let Some(value) = lookup(JSON_LOGS_ENV) {
        config.telemetry.json_logs = parse_bool(JSON_LOGS_ENV, &value)?;
    }

    if let Some(value) = lookup(AUDIT_ENABLED_ENV) {
        config.audit.enabled = parse_bool(AUDIT_ENABLED_ENV, &value)?;
    }

    if let Some(value) = lookup(AUDIT_CAPACITY_ENV) {
        config.audit.capacity = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::environment(AUDIT_CAPACITY_ENV, "expected a positive integer"))?;
    }

    Ok(config)
}

fn parse_bool(variable: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::environment(
            variable,
            format!("expected a boolean, got '{other}'"),
        )),
    }
}
