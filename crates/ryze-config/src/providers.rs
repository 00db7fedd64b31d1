//! LLM provider configuration types.

use serde::Deserialize;
use serde_json::Value;

/// Built-in backend used when the config declares none.
const DEFAULT_BACKEND_NAME: &str = "gemini";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

/// Root configuration for LLM providers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersConfig {
    /// Default backend name.
    #[serde(default)]
    pub default_backend: Option<String>,
    /// Backend definitions.
    #[serde(default)]
    pub backends: Vec<BackendSpec>,
}

impl ProvidersConfig {
    /// Get backend by name.
    pub fn get_backend(&self, name: &str) -> Option<BackendSpec> {
        self.backends.iter().find(|b| b.name == name).cloned()
    }

    /// Get default backend.
    ///
    /// Resolution order: `default_backend`, then the first declared
    /// backend, then the built-in Gemini backend.
    pub fn get_default_backend(&self) -> Option<BackendSpec> {
        if let Some(name) = &self.default_backend {
            return self.get_backend(name);
        }
        Some(
            self.backends
                .first()
                .cloned()
                .unwrap_or_else(BackendSpec::builtin_gemini),
        )
    }

    /// List all backend names.
    pub fn backend_names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name.clone()).collect()
    }
}

/// Backend configuration (auth, endpoint, vendor).
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSpec {
    /// Backend identifier.
    pub name: String,
    /// Backend kind: "gemini" | "openai" | "openai_compatible" | "mock".
    pub kind: String,
    /// Optional custom endpoint URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Environment variable name containing the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Model identifier (e.g. "gemini-2.5-flash", "gpt-4o-mini").
    #[serde(default)]
    pub model: Option<String>,
    /// Backend-specific settings (max_output_tokens, top_p, ...).
    #[serde(default)]
    pub config: Value,
}

impl BackendSpec {
    /// Gemini backend reading its key from `GEMINI_API_KEY`.
    pub fn builtin_gemini() -> Self {
        Self {
            name: DEFAULT_BACKEND_NAME.to_string(),
            kind: "gemini".to_string(),
            endpoint: None,
            api_key_env: Some(DEFAULT_GEMINI_KEY_ENV.to_string()),
            model: Some(DEFAULT_GEMINI_MODEL.to_string()),
            config: Value::Null,
        }
    }

    /// Resolve the API key from environment variable.
    pub fn resolve_api_key(&self) -> Result<String, ApiKeyError> {
        let env_name = self.api_key_env.as_ref().ok_or(ApiKeyError::NotConfigured)?;
        match std::env::var(env_name) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ApiKeyError::EnvNotFound(env_name.clone())),
        }
    }

    /// Read backend config value as typed object.
    pub fn get_config<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Errors related to API key resolution.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiKeyError {
    #[error("API key environment variable not configured")]
    NotConfigured,
    #[error("Environment variable '{0}' not found")]
    EnvNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backend_falls_back_to_gemini() {
        let config = ProvidersConfig::default();
        let backend = config.get_default_backend().unwrap();
        assert_eq!(backend.kind, "gemini");
        assert_eq!(backend.api_key_env.as_deref(), Some("GEMINI_API_KEY"));
        assert!(config.backend_names().is_empty());
    }

    #[test]
    fn test_named_default_backend() {
        let config: ProvidersConfig = serde_yaml::from_str(
            r#"
default_backend: local
backends:
  - name: cloud
    kind: gemini
  - name: local
    kind: openai_compatible
    endpoint: http://localhost:11434/v1/chat/completions
    model: llama3
    config:
      max_output_tokens: 2048
"#,
        )
        .unwrap();
        let backend = config.get_default_backend().unwrap();
        assert_eq!(backend.name, "local");
        assert_eq!(backend.get_config::<u32>("max_output_tokens"), Some(2048));
        assert_eq!(backend.get_config::<u32>("missing"), None);
    }

    #[test]
    fn test_resolve_api_key_errors() {
        let mut backend = BackendSpec::builtin_gemini();
        backend.api_key_env = None;
        assert!(matches!(
            backend.resolve_api_key(),
            Err(ApiKeyError::NotConfigured)
        ));
        backend.api_key_env = Some("RYZE_TEST_KEY_THAT_IS_NEVER_SET".to_string());
        assert!(matches!(
            backend.resolve_api_key(),
            Err(ApiKeyError::EnvNotFound(_))
        ));
    }
}
