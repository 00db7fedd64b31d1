//! Configuration loading and validation.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::{ProvidersConfig, RyzeConfig};

/// Config path used when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "configs/ryze.yaml";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load full Ryze configuration from YAML file.
pub fn load_config(path: &Path) -> Result<RyzeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from YAML text.
pub fn parse_config(content: &str) -> Result<RyzeConfig, ConfigError> {
    let config: RyzeConfig = serde_yaml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &RyzeConfig) -> Result<(), ConfigError> {
    if config.version == 0 {
        return Err(ConfigError::Invalid(
            "version must be greater than 0".to_string(),
        ));
    }

    if config.app.name.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "app.name must not be empty".to_string(),
        ));
    }

    if config.server.listen.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "server.listen must not be empty".to_string(),
        ));
    }

    let gateway = &config.gateway;
    if gateway.max_attempts == 0 {
        return Err(ConfigError::Invalid(
            "gateway.max_attempts must be >= 1".to_string(),
        ));
    }
    if gateway.timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "gateway.timeout_secs must be > 0".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&gateway.jitter_ratio) {
        return Err(ConfigError::Invalid(
            "gateway.jitter_ratio must be within [0, 1]".to_string(),
        ));
    }
    if gateway.max_delay_ms < gateway.base_delay_ms {
        return Err(ConfigError::Invalid(
            "gateway.max_delay_ms must be >= gateway.base_delay_ms".to_string(),
        ));
    }

    if config.pipeline.event_buffer == 0 {
        return Err(ConfigError::Invalid(
            "pipeline.event_buffer must be > 0".to_string(),
        ));
    }
    if config.pipeline.code_chunk_lines == 0 {
        return Err(ConfigError::Invalid(
            "pipeline.code_chunk_lines must be > 0".to_string(),
        ));
    }

    validate_providers(&config.providers)?;

    Ok(())
}

fn validate_providers(config: &ProvidersConfig) -> Result<(), ConfigError> {
    for backend in &config.backends {
        if backend.name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "providers.backends[].name must not be empty".to_string(),
            ));
        }
        if backend.kind.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "providers.backends[{}].kind must not be empty",
                backend.name
            )));
        }
    }

    if let Some(default_backend) = &config.default_backend {
        if config.get_backend(default_backend).is_none() {
            return Err(ConfigError::Invalid(format!(
                "providers.default_backend '{}' not found",
                default_backend
            )));
        }
    }

    Ok(())
}
