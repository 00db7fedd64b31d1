//! Bootstrap helpers for starting Ryze from a single YAML config.

use std::fs::{create_dir_all, File, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use thiserror::Error;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use ryze_config::{load_config, ConfigError, ObservabilityConfig, RyzeConfig};
use ryze_core::VersionStore;
use ryze_llm::{build_client_from_backend, GatewayOptions, LlmBuildError, LlmClient, ModelGateway};
use ryze_stores::InMemoryVersionStore;

use crate::orchestrator::{Orchestrator, OrchestratorConfig};

/// Runtime bootstrap errors.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("llm client build error: {0}")]
    LlmBuild(#[from] LlmBuildError),
    #[error("backend '{0}' not found")]
    BackendNotFound(String),
}

/// Running app bundle created from unified config.
pub struct RuntimeApp {
    pub orchestrator: Orchestrator,
    pub store: Arc<dyn VersionStore>,
    pub config: Arc<RyzeConfig>,
}

static TRACING_INIT: OnceLock<()> = OnceLock::new();

impl RuntimeApp {
    /// Create a runnable app from a single `ryze.yaml`.
    pub fn from_config_path(path: impl AsRef<Path>) -> Result<Self, BootstrapError> {
        let config = load_config(path.as_ref())?;
        Self::from_config(config)
    }

    /// Create a runnable app from an already loaded config, using the
    /// configured default backend.
    pub fn from_config(config: RyzeConfig) -> Result<Self, BootstrapError> {
        init_tracing_if_needed(&config.observability);
        let backend = config.providers.get_default_backend().ok_or_else(|| {
            BootstrapError::BackendNotFound(
                config.providers.default_backend.clone().unwrap_or_default(),
            )
        })?;
        let client = build_client_from_backend(&backend)?;
        tracing::info!(
            backend = %backend.name,
            kind = %backend.kind,
            model = backend.model.as_deref().unwrap_or("(default)"),
            "llm backend selected"
        );
        Ok(Self::with_client(config, client))
    }

    /// Create an app around an explicit client.
    pub fn with_client(config: RyzeConfig, client: Arc<dyn LlmClient>) -> Self {
        let gateway = ModelGateway::new(
            client,
            GatewayOptions::from_config(&config.gateway, &config.pipeline),
        );
        let store: Arc<dyn VersionStore> = Arc::new(InMemoryVersionStore::new());
        let orchestrator = Orchestrator::with_config(
            gateway,
            store.clone(),
            OrchestratorConfig::from(&config.pipeline),
        );
        Self {
            orchestrator,
            store,
            config: Arc::new(config),
        }
    }
}

/// Install the global tracing subscriber once.
///
/// `RUST_LOG` wins over `observability.log_level`; `RYZE_LOG_FILE` wins over
/// `observability.log_file`. Without a usable log file, logs go to stderr.
pub fn init_tracing_if_needed(observability: &ObservabilityConfig) {
    TRACING_INIT.get_or_init(|| {
        let env_file = std::env::var("RYZE_LOG_FILE").ok();
        let log_file = log_file_path(env_file.as_deref(), observability);
        let file = log_file.as_deref().and_then(open_log_file);

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(observability.log_level.trim()))
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let span_events = if observability.traces_enabled {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let ansi = file.is_none();
        let writer = match file {
            Some(file) => BoxMakeWriter::new(Mutex::new(file)),
            None => BoxMakeWriter::new(std::io::stderr),
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(ansi)
            .with_writer(writer)
            .with_span_events(span_events)
            .try_init();

        tracing::info!(
            log_level = %observability.log_level,
            traces_enabled = observability.traces_enabled,
            log_file = log_file.as_deref().unwrap_or("(stderr)"),
            "tracing initialized"
        );
    });
}

fn log_file_path(env_value: Option<&str>, observability: &ObservabilityConfig) -> Option<String> {
    env_value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| observability.log_file.clone())
}

fn open_log_file(path: &str) -> Option<File> {
    let path = Path::new(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(err) = create_dir_all(parent) {
            eprintln!("failed to create log directory '{}': {}", parent.display(), err);
            return None;
        }
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| eprintln!("failed to open log file '{}': {}", path.display(), err))
        .ok()
}
