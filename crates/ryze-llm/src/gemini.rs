//! Gemini LLM client implementation.
//!
//! This module provides a client for Google's Gemini REST API, both
//! `generateContent` and the SSE flavor of `streamGenerateContent`.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::client::{resolve_api_key, LlmClient, LlmRequest, TextStream};
use crate::error::LlmError;
use crate::retry::{classify_message, classify_status};
use crate::sse::SseDecoder;

/// Finish reasons that mean the model refused to answer.
const BLOCKED_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

/// Gemini client configuration.
#[derive(Debug, Clone)]
pub struct GeminiClientConfig {
    /// Explicit API key; takes precedence over `api_key_env`.
    pub api_key: Option<String>,
    /// Environment variable read at call time when no explicit key is set.
    pub api_key_env: String,
    /// Model name (e.g., "gemini-2.5-flash").
    pub model: String,
    /// Base endpoint URL.
    pub endpoint: String,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
    /// Connect timeout in seconds; overall call time is bounded by the gateway.
    pub connect_timeout_secs: u64,
}

impl Default for GeminiClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            max_output_tokens: Some(8192),
            top_p: Some(0.8),
            connect_timeout_secs: 10,
        }
    }
}

/// Gemini LLM client.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiClientConfig,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(config: GeminiClientConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn build_url(&self, model: &str, method: &str, api_key: &str) -> String {
        let alt = if method == "streamGenerateContent" {
            "alt=sse&"
        } else {
            ""
        };
        format!(
            "{}/models/{}:{}?{}key={}",
            self.config.endpoint.trim_end_matches('/'),
            model,
            method,
            alt,
            api_key
        )
    }

    fn build_body(&self, request: LlmRequest) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart { text: request.user }],
            }],
            system_instruction: if request.system.is_empty() {
                None
            } else {
                Some(GeminiSystemInstruction {
                    parts: vec![GeminiPart {
                        text: request.system,
                    }],
                })
            },
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature,
                top_p: self.config.top_p,
                max_output_tokens: self.config.max_output_tokens,
            },
        }
    }

    async fn send(&self, request: LlmRequest, method: &str) -> Result<reqwest::Response, LlmError> {
        let api_key = resolve_api_key(
            self.config.api_key.as_deref(),
            Some(self.config.api_key_env.as_str()),
            true,
        )?
        .unwrap_or_default();
        let model = if request.model.trim().is_empty() {
            self.config.model.clone()
        } else {
            request.model.clone()
        };
        let url = self.build_url(&model, method, &api_key);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let body = self.build_body(request);
        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiResponse>(&text)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or(text);
            return Err(classify_status(status, &message));
        }
        Ok(response)
    }
}

// Gemini API request/response structures

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
    code: Option<u16>,
    /// Canonical status name, e.g. `UNAVAILABLE`.
    #[serde(default)]
    status: Option<String>,
}

/// Text carried by one response object; `Ok(None)` when it has none.
fn response_text(parsed: GeminiResponse) -> Result<Option<String>, LlmError> {
    if let Some(error) = parsed.error {
        return Err(match error.code {
            Some(code) => classify_status(code, &error.message),
            None => match error.status {
                Some(status) => classify_message(&format!("{}: {}", status, error.message)),
                None => classify_message(&error.message),
            },
        });
    }
    if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(LlmError::SafetyBlocked(reason));
    }

    let Some(candidate) = parsed.candidates.and_then(|c| c.into_iter().next()) else {
        return Ok(None);
    };
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        if let Some(reason) = candidate
            .finish_reason
            .filter(|r| BLOCKED_FINISH_REASONS.contains(&r.as_str()))
        {
            return Err(LlmError::SafetyBlocked(reason));
        }
        return Ok(None);
    }
    Ok(Some(text))
}

fn decode_chunk(decoder: &mut SseDecoder, chunk: &Bytes) -> Vec<Result<Option<String>, LlmError>> {
    decoder
        .push(chunk)
        .into_iter()
        .map(|data| -> Result<Option<String>, LlmError> {
            let parsed: GeminiResponse = serde_json::from_str(&data)?;
            response_text(parsed)
        })
        .collect()
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: LlmRequest) -> Result<String, LlmError> {
        let response = self.send(request, "generateContent").await?;
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let parsed: GeminiResponse = serde_json::from_str(&text)?;
        let content = response_text(parsed)?
            .ok_or_else(|| LlmError::Response("Empty response from Gemini API".to_string()))?;
        Ok(content.trim().to_string())
    }

    async fn stream(&self, request: LlmRequest) -> Result<TextStream, LlmError> {
        let response = self.send(request, "streamGenerateContent").await?;
        let mut body = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(LlmError::Network(e.without_url().to_string()));
                        return;
                    }
                };
                for item in decode_chunk(&mut decoder, &chunk) {
                    match item {
                        Ok(Some(text)) => yield Ok(text),
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }
            if let Some(data) = decoder.finish() {
                match serde_json::from_str::<GeminiResponse>(&data)
                    .map_err(LlmError::from)
                    .and_then(response_text)
                {
                    Ok(Some(text)) => yield Ok(text),
                    Ok(None) => {}
                    Err(e) => yield Err(e),
                }
            }
        };
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(GeminiClientConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = GeminiClientConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.api_key_env, "GEMINI_API_KEY");
        assert!(config
            .endpoint
            .contains("generativelanguage.googleapis.com"));
    }

    #[test]
    fn test_build_url() {
        let client = client();
        let url = client.build_url("gemini-1.5-pro", "generateContent", "test-key");
        assert!(url.contains("gemini-1.5-pro:generateContent?key=test-key"));
        let url = client.build_url("gemini-1.5-pro", "streamGenerateContent", "test-key");
        assert!(url.contains(":streamGenerateContent?alt=sse&key=test-key"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = client().build_body(LlmRequest::new("be terse", "hi").with_temperature(0.1));
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "be terse");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 8192);

        let body = client().build_body(LlmRequest::new("", "hi"));
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_response_text_variants() {
        let ok: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hel"},{"text":"lo"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response_text(ok).unwrap().as_deref(), Some("Hello"));

        let blocked: GeminiResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(matches!(
            response_text(blocked),
            Err(LlmError::SafetyBlocked(_))
        ));

        let finish: GeminiResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(matches!(response_text(finish), Err(LlmError::SafetyBlocked(_))));

        let quota: GeminiResponse = serde_json::from_str(
            r#"{"error":{"code":429,"message":"quota","status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .unwrap();
        assert!(matches!(
            response_text(quota),
            Err(LlmError::RateLimited { status: 429, .. })
        ));

        let overloaded: GeminiResponse = serde_json::from_str(
            r#"{"error":{"message":"The model is overloaded. Please try again later.","status":"UNAVAILABLE"}}"#,
        )
        .unwrap();
        let err = response_text(overloaded).unwrap_err();
        assert!(matches!(err, LlmError::Server { .. }));
        assert!(err.is_transient());

        let invalid: GeminiResponse = serde_json::from_str(
            r#"{"error":{"message":"Invalid JSON payload","status":"INVALID_ARGUMENT"}}"#,
        )
        .unwrap();
        assert!(!response_text(invalid).unwrap_err().is_transient());

        let usage_only: GeminiResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[]},"finishReason":"STOP"}]}"#)
                .unwrap();
        assert_eq!(response_text(usage_only).unwrap(), None);
    }

    #[test]
    fn test_decode_stream_chunks() {
        let mut decoder = SseDecoder::new();
        let chunk = Bytes::from_static(
            b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"A\"}]}}]}\r\n\r\ndata: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"B\"}]}}]}\r\n\r\n",
        );
        let items: Vec<Option<String>> = decode_chunk(&mut decoder, &chunk)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(items, vec![Some("A".to_string()), Some("B".to_string())]);
    }

    #[tokio::test]
    async fn test_missing_key_fails_at_call_time() {
        let client = GeminiClient::new(GeminiClientConfig {
            api_key: None,
            api_key_env: "RYZE_GEMINI_KEY_NEVER_SET".to_string(),
            ..Default::default()
        })
        .expect("construction must not need the key");
        let err = client.complete(LlmRequest::new("", "hi")).await.unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey(_)));
    }

    #[tokio::test]
    #[ignore = "requires live GEMINI_API_KEY and network"]
    async fn test_live_gemini_completion_when_env_set() {
        if std::env::var("GEMINI_API_KEY").map(|v| v.trim().is_empty()).unwrap_or(true) {
            eprintln!("skipped: GEMINI_API_KEY is not set");
            return;
        }
        let client = GeminiClient::new(GeminiClientConfig::default()).expect("client");
        let response = client
            .complete(LlmRequest::new("You are a concise assistant.", "Reply with exactly: OK"))
            .await
            .expect("live Gemini completion should succeed");
        assert!(!response.trim().is_empty());
    }
}
