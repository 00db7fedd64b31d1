use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};

use crate::error::LlmError;

/// Forward-only stream of text fragments from one model call.
pub type TextStream = BoxStream<'static, Result<String, LlmError>>;

/// LLM request payload
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// System instruction; empty means none.
    pub system: String,
    pub user: String,
    /// Model override; empty uses the client's configured model.
    pub model: String,
    pub temperature: f32,
}

impl LlmRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            model: String::new(),
            temperature: 0.1,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// LLM client trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> Result<String, LlmError>;

    /// Stream the response as it is produced.
    ///
    /// The default implementation yields the full completion as one chunk.
    async fn stream(&self, request: LlmRequest) -> Result<TextStream, LlmError> {
        let text = self.complete(request).await?;
        Ok(Box::pin(stream::once(async move { Ok(text) })))
    }
}

#[async_trait]
impl LlmClient for Arc<dyn LlmClient> {
    async fn complete(&self, request: LlmRequest) -> Result<String, LlmError> {
        (**self).complete(request).await
    }

    async fn stream(&self, request: LlmRequest) -> Result<TextStream, LlmError> {
        (**self).stream(request).await
    }
}

/// Resolve an API key at call time.
///
/// An explicit key wins over the environment variable. A missing key is an
/// error only when `required` is set.
pub(crate) fn resolve_api_key(
    explicit: Option<&str>,
    env_name: Option<&str>,
    required: bool,
) -> Result<Option<String>, LlmError> {
    if let Some(key) = explicit.filter(|k| !k.trim().is_empty()) {
        return Ok(Some(key.to_string()));
    }
    if let Some(name) = env_name {
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => return Ok(Some(value)),
            _ if required => return Err(LlmError::MissingApiKey(name.to_string())),
            _ => {}
        }
    }
    if required {
        return Err(LlmError::MissingApiKey(
            env_name.unwrap_or("<unset>").to_string(),
        ));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    struct Echo;

    #[async_trait]
    impl LlmClient for Echo {
        async fn complete(&self, request: LlmRequest) -> Result<String, LlmError> {
            Ok(request.user)
        }
    }

    #[test]
    fn test_default_stream_yields_single_chunk() {
        tokio_test::block_on(async {
            let client: Arc<dyn LlmClient> = Arc::new(Echo);
            let mut stream = client.stream(LlmRequest::new("", "hello")).await.unwrap();
            assert_eq!(stream.next().await.unwrap().unwrap(), "hello");
            assert!(stream.next().await.is_none());
        });
    }

    #[test]
    fn test_resolve_api_key() {
        assert_eq!(
            resolve_api_key(Some("k"), Some("RYZE_UNSET_ENV_FOR_TEST"), true).unwrap(),
            Some("k".to_string())
        );
        assert_eq!(
            resolve_api_key(None, Some("RYZE_UNSET_ENV_FOR_TEST"), false).unwrap(),
            None
        );
        assert!(matches!(
            resolve_api_key(None, Some("RYZE_UNSET_ENV_FOR_TEST"), true),
            Err(LlmError::MissingApiKey(name)) if name == "RYZE_UNSET_ENV_FOR_TEST"
        ));
        assert!(matches!(
            resolve_api_key(None, None, true),
            Err(LlmError::MissingApiKey(_))
        ));
    }
}
