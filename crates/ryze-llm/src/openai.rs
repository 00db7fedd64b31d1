//! HTTP LLM client for OpenAI-compatible chat completion APIs.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::client::{resolve_api_key, LlmClient, LlmRequest, TextStream};
use crate::error::LlmError;
use crate::retry::{classify_message, classify_status};
use crate::sse::SseDecoder;

const STREAM_DONE: &str = "[DONE]";

/// HTTP client config (OpenAI-compatible)
#[derive(Debug, Clone)]
pub struct HttpLlmClientConfig {
    pub endpoint: String,
    /// Explicit API key; takes precedence over `api_key_env`.
    pub api_key: Option<String>,
    /// Environment variable read at call time.
    pub api_key_env: Option<String>,
    /// Fail with `MissingApiKey` when no key can be resolved.
    pub require_api_key: bool,
    pub model: String,
    pub max_tokens: Option<u32>,
    /// Connect timeout in seconds; overall call time is bounded by the gateway.
    pub connect_timeout_secs: u64,
    pub extra_headers: HeaderMap,
}

impl Default for HttpLlmClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: None,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            require_api_key: true,
            model: "gpt-4o-mini".to_string(),
            max_tokens: None,
            connect_timeout_secs: 10,
            extra_headers: HeaderMap::new(),
        }
    }
}

/// HTTP LLM client using an OpenAI-compatible API
pub struct HttpLlmClient {
    client: reqwest::Client,
    config: HttpLlmClientConfig,
}

impl HttpLlmClient {
    pub fn new(config: HttpLlmClientConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn build_body(&self, request: LlmRequest, stream: bool) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if !request.system.is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: request.system,
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.user,
        });
        ChatRequest {
            model: if request.model.trim().is_empty() {
                self.config.model.clone()
            } else {
                request.model
            },
            messages,
            temperature: request.temperature,
            max_tokens: self.config.max_tokens,
            stream,
        }
    }

    async fn send(&self, request: LlmRequest, stream: bool) -> Result<reqwest::Response, LlmError> {
        let api_key = resolve_api_key(
            self.config.api_key.as_deref(),
            self.config.api_key_env.as_deref(),
            self.config.require_api_key,
        )?;

        let mut headers = self.config.extra_headers.clone();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let value = format!("Bearer {}", key);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&value).map_err(|e| LlmError::Config(e.to_string()))?,
            );
        }

        let body = self.build_body(request, stream);
        let response = self
            .client
            .post(&self.config.endpoint)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }
        Ok(response)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    error: Option<ChatErrorDetail>,
}

/// Error object some compatible servers send with a 200 status or as an
/// SSE payload.
#[derive(Debug, Deserialize)]
struct ChatErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl ChatErrorDetail {
    fn into_error(self) -> LlmError {
        match self.kind {
            Some(kind) => classify_message(&format!("{}: {}", kind, self.message)),
            None => classify_message(&self.message),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChunk {
    #[serde(default)]
    choices: Vec<ChatStreamChoice>,
    #[serde(default)]
    error: Option<ChatErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChoice {
    #[serde(default)]
    delta: ChatDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChatDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Text delta of one streamed event; `None` for role-only or usage events.
fn stream_delta(data: &str) -> Result<Option<String>, LlmError> {
    let chunk: ChatStreamChunk = serde_json::from_str(data)?;
    if let Some(error) = chunk.error {
        return Err(error.into_error());
    }
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|text| !text.is_empty()))
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, request: LlmRequest) -> Result<String, LlmError> {
        let response = self.send(request, false).await?;
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;
        let parsed: ChatResponse = serde_json::from_str(&text)?;
        if let Some(error) = parsed.error {
            return Err(error.into_error());
        }

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Response("Missing choices".to_string()))?;
        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(LlmError::SafetyBlocked("content_filter".to_string()));
        }
        choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::Response("Empty message content".to_string()))
    }

    async fn stream(&self, request: LlmRequest) -> Result<TextStream, LlmError> {
        let response = self.send(request, true).await?;
        let mut body = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            'read: while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(LlmError::Network(e.to_string()));
                        return;
                    }
                };
                for data in decoder.push(&chunk) {
                    if data.trim() == STREAM_DONE {
                        break 'read;
                    }
                    match stream_delta(&data) {
                        Ok(Some(text)) => yield Ok(text),
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }
}
