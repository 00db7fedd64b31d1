//! LLM access for Ryze.
//!
//! This crate provides:
//! - The `LlmClient` trait with single-shot and streaming completion
//! - Google Gemini and OpenAI-compatible HTTP clients
//! - A scripted mock client for tests
//! - `ModelGateway`: timeout, retry and backoff around any client
//!
//! Use `build_client_from_backend` to create clients from configuration.

mod client;
mod error;
mod factory;
mod gateway;
mod gemini;
mod mock;
mod openai;
pub mod retry;
mod sse;
mod text;

pub use client::{LlmClient, LlmRequest, TextStream};
pub use error::{LlmError, RetryCause};
pub use factory::{build_client_from_backend, LlmBuildError};
pub use gateway::{GatewayOptions, ModelGateway};
pub use gemini::{GeminiClient, GeminiClientConfig};
pub use mock::{MockLlmClient, MockReply};
pub use openai::{HttpLlmClient, HttpLlmClientConfig};
pub use retry::RetryPolicy;
pub use sse::SseDecoder;
pub use text::{extract_json, strip_code_fences, truncate_for_log};
