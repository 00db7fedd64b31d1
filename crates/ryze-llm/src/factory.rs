//! LLM client factory for building clients from backend configuration.

use std::sync::Arc;

use thiserror::Error;

use ryze_config::BackendSpec;

use crate::client::LlmClient;
use crate::error::LlmError;
use crate::gemini::{GeminiClient, GeminiClientConfig};
use crate::mock::MockLlmClient;
use crate::openai::{HttpLlmClient, HttpLlmClientConfig};

/// Errors that can occur when building an LLM client.
#[derive(Debug, Error)]
pub enum LlmBuildError {
    #[error("unknown backend kind: {0}")]
    UnknownKind(String),
    #[error("backend '{0}' requires an endpoint")]
    MissingEndpoint(String),
    #[error(transparent)]
    Client(#[from] LlmError),
}

/// Build an LLM client from a backend spec.
///
/// API keys are resolved when a call is made, not here, so a server can
/// start without credentials and report the problem per request.
pub fn build_client_from_backend(
    backend: &BackendSpec,
) -> Result<Arc<dyn LlmClient>, LlmBuildError> {
    let connect_timeout_secs = backend.get_config::<u64>("connect_timeout_secs");
    match backend.kind.to_lowercase().as_str() {
        "gemini" | "google" => {
            let defaults = GeminiClientConfig::default();
            let config = GeminiClientConfig {
                api_key: None,
                api_key_env: backend.api_key_env.clone().unwrap_or(defaults.api_key_env),
                model: backend.model.clone().unwrap_or(defaults.model),
                endpoint: backend.endpoint.clone().unwrap_or(defaults.endpoint),
                max_output_tokens: backend
                    .get_config::<u32>("max_output_tokens")
                    .or(defaults.max_output_tokens),
                top_p: backend.get_config::<f32>("top_p").or(defaults.top_p),
                connect_timeout_secs: connect_timeout_secs
                    .unwrap_or(defaults.connect_timeout_secs),
            };
            Ok(Arc::new(GeminiClient::new(config)?))
        }
        kind @ ("openai" | "openai_compatible") => {
            let compatible = kind == "openai_compatible";
            let defaults = HttpLlmClientConfig::default();
            let endpoint = match (&backend.endpoint, compatible) {
                (Some(endpoint), _) => endpoint.clone(),
                (None, false) => defaults.endpoint,
                (None, true) => return Err(LlmBuildError::MissingEndpoint(backend.name.clone())),
            };
            let config = HttpLlmClientConfig {
                endpoint,
                api_key: None,
                api_key_env: backend.api_key_env.clone().or(if compatible {
                    None
                } else {
                    defaults.api_key_env
                }),
                require_api_key: !compatible,
                model: backend.model.clone().unwrap_or(defaults.model),
                max_tokens: backend.get_config::<u32>("max_output_tokens"),
                connect_timeout_secs: connect_timeout_secs
                    .unwrap_or(defaults.connect_timeout_secs),
                extra_headers: defaults.extra_headers,
            };
            Ok(Arc::new(HttpLlmClient::new(config)?))
        }
        "mock" => {
            let response = backend
                .get_config::<String>("response")
                .unwrap_or_else(|| "{}".to_string());
            Ok(Arc::new(MockLlmClient::new(response)))
        }
        _ => Err(LlmBuildError::UnknownKind(backend.kind.clone())),
    }
}
