//! # Ryze Config
//!
//! Unified single-file configuration management for Ryze.
//! A single `ryze.yaml` configures the HTTP server, LLM providers, the
//! model gateway retry policy, pipeline behavior and observability.

mod loader;
mod providers;

pub use loader::{load_config, parse_config, ConfigError, DEFAULT_CONFIG_PATH};
pub use providers::{ApiKeyError, BackendSpec, ProvidersConfig};

use serde::Deserialize;

/// Top-level configuration schema for Ryze.
#[derive(Debug, Clone, Deserialize)]
pub struct RyzeConfig {
    /// Config schema version.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for RyzeConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            app: AppConfig::default(),
            server: ServerConfig::default(),
            providers: ProvidersConfig::default(),
            gateway: GatewayConfig::default(),
            pipeline: PipelineConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl RyzeConfig {
    pub fn providers(&self) -> &ProvidersConfig {
        &self.providers
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            environment: default_env(),
        }
    }
}

fn default_app_name() -> String {
    "ryze".to_string()
}

fn default_env() -> String {
    "development".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to.
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:3000".to_string()
}

/// Retry and timeout policy for every model call.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Per-attempt timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total attempts including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Fraction of the delay randomized in both directions.
    #[serde(default = "default_jitter_ratio")]
    pub jitter_ratio: f64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_ratio: default_jitter_ratio(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8_000
}

fn default_jitter_ratio() -> f64 {
    0.25
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Render committed trees to code and stream it.
    #[serde(default = "default_true")]
    pub emit_code: bool,
    /// Lines per streamed code chunk.
    #[serde(default = "default_code_chunk_lines")]
    pub code_chunk_lines: usize,
    /// Capacity of the per-request progress channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Conversation turns passed to the planner.
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            emit_code: default_true(),
            code_chunk_lines: default_code_chunk_lines(),
            event_buffer: default_event_buffer(),
            max_history: default_max_history(),
        }
    }
}

fn default_temperature() -> f32 {
    0.1
}

fn default_true() -> bool {
    true
}

fn default_code_chunk_lines() -> usize {
    4
}

fn default_event_buffer() -> usize {
    64
}

fn default_max_history() -> usize {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub traces_enabled: bool,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            traces_enabled: false,
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
