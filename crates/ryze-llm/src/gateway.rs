//! Model gateway: one place where every model call gets a deadline and a
//! retry budget.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tracing::{debug, info, warn, Level};

use ryze_config::{GatewayConfig, PipelineConfig};

use crate::client::{LlmClient, LlmRequest, TextStream};
use crate::error::{LlmError, RetryCause};
use crate::retry::{backoff_delay, RetryPolicy};
use crate::text::truncate_for_log;

/// Gateway call settings.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub policy: RetryPolicy,
    /// Deadline for one attempt, and for each chunk of a stream.
    pub timeout: Duration,
    /// Model override passed to the client; empty keeps the client default.
    pub model: String,
    pub temperature: f32,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::default(),
            timeout: Duration::from_secs(60),
            model: String::new(),
            temperature: 0.1,
        }
    }
}

impl GatewayOptions {
    pub fn from_config(gateway: &GatewayConfig, pipeline: &PipelineConfig) -> Self {
        Self {
            policy: RetryPolicy::from(gateway),
            timeout: Duration::from_secs(gateway.timeout_secs.max(1)),
            model: String::new(),
            temperature: pipeline.temperature,
        }
    }
}

/// Timeout, retry and backoff around an [`LlmClient`].
#[derive(Clone)]
pub struct ModelGateway {
    client: Arc<dyn LlmClient>,
    options: GatewayOptions,
}

impl ModelGateway {
    pub fn new(client: Arc<dyn LlmClient>, options: GatewayOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    fn request(&self, system: Option<&str>, user: &str) -> LlmRequest {
        let mut request =
            LlmRequest::new(system.unwrap_or_default(), user).with_temperature(self.options.temperature);
        request.model = self.options.model.clone();
        request
    }

    /// Single-shot completion.
    pub async fn complete(&self, system: Option<&str>, user: &str) -> Result<String, LlmError> {
        let request = self.request(system, user);
        if tracing::enabled!(Level::DEBUG) {
            debug!(
                system = %truncate_for_log(&request.system, 2_000),
                user = %truncate_for_log(&request.user, 2_000),
                "model prompt"
            );
        }

        let timeout = self.options.timeout;
        let text = self
            .with_retry("complete", || {
                let request = request.clone();
                async move {
                    tokio::time::timeout(timeout, self.client.complete(request))
                        .await
                        .map_err(|_| LlmError::Timeout(timeout))?
                }
            })
            .await?;

        if tracing::enabled!(Level::DEBUG) {
            debug!(output = %truncate_for_log(&text, 2_000), "model output");
        }
        Ok(text)
    }

    /// Streaming completion.
    ///
    /// Opening the stream is retried like [`complete`](Self::complete).
    /// Once chunks flow, a chunk that takes longer than the timeout ends the
    /// stream with `LlmError::Timeout`; partial output is never retried.
    pub async fn stream(&self, system: Option<&str>, user: &str) -> Result<TextStream, LlmError> {
        let request = self.request(system, user);
        if tracing::enabled!(Level::DEBUG) {
            debug!(
                system = %truncate_for_log(&request.system, 2_000),
                user = %truncate_for_log(&request.user, 2_000),
                "model stream prompt"
            );
        }

        let timeout = self.options.timeout;
        let mut inner = self
            .with_retry("stream", || {
                let request = request.clone();
                async move {
                    tokio::time::timeout(timeout, self.client.stream(request))
                        .await
                        .map_err(|_| LlmError::Timeout(timeout))?
                }
            })
            .await?;

        let stream = async_stream::stream! {
            loop {
                match tokio::time::timeout(timeout, inner.next()).await {
                    Ok(Some(Ok(chunk))) => yield Ok(chunk),
                    Ok(Some(Err(err))) => {
                        warn!(error = %err, "model stream failed");
                        yield Err(err);
                        break;
                    }
                    Ok(None) => break,
                    Err(_) => {
                        warn!(timeout_ms = timeout.as_millis() as u64, "model stream stalled");
                        yield Err(LlmError::Timeout(timeout));
                        break;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }

    async fn with_retry<T, F, Fut>(&self, op: &'static str, mut call: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let policy = &self.options.policy;
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let err = match call().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(op, attempt, "model call recovered after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            let Some(cause) = err.retry_cause() else {
                warn!(op, attempt, error = %err, "model call failed");
                return Err(err);
            };
            if attempt >= max_attempts {
                warn!(op, attempts = attempt, cause = %cause, error = %err, "model retries exhausted");
                return Err(exhausted(attempt, cause, err));
            }

            let delay = backoff_delay(policy, attempt - 1, rand::random::<f64>());
            warn!(
                op,
                model = %self.options.model,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transient model error, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn exhausted(attempts: u32, cause: RetryCause, last: LlmError) -> LlmError {
    LlmError::RetriesExhausted {
        attempts,
        cause,
        last: Box::new(last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockLlmClient, MockReply};
    use async_trait::async_trait;
    use futures_util::stream;

    fn gateway(client: Arc<MockLlmClient>, max_attempts: u32) -> ModelGateway {
        ModelGateway::new(
            client,
            GatewayOptions {
                policy: RetryPolicy {
                    max_attempts,
                    base_delay: Duration::from_millis(100),
                    max_delay: Duration::from_secs(1),
                    jitter_ratio: 0.0,
                },
                timeout: Duration::from_secs(5),
                ..Default::default()
            },
        )
    }

    fn server_error() -> MockReply {
        MockReply::Fail(LlmError::Server {
            status: 503,
            message: "overloaded".to_string(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let client = Arc::new(MockLlmClient::scripted([
            server_error(),
            MockReply::Fail(LlmError::Network("connection reset".into())),
            MockReply::text("ok"),
        ]));
        let gw = gateway(client.clone(), 3);
        assert_eq!(gw.complete(Some("sys"), "hi").await.unwrap(), "ok");
        assert_eq!(client.call_count(), 3);
        assert_eq!(client.requests()[0].system, "sys");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_is_bounded() {
        let client = Arc::new(MockLlmClient::scripted([
            server_error(),
            server_error(),
            server_error(),
            MockReply::text("never reached"),
        ]));
        let gw = gateway(client.clone(), 3);
        let err = gw.complete(None, "hi").await.unwrap_err();
        match err {
            LlmError::RetriesExhausted {
                attempts, cause, ..
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(cause, RetryCause::Server);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_is_not_retried() {
        let client = Arc::new(MockLlmClient::scripted([
            MockReply::Fail(LlmError::BadRequest("bad".into())),
            MockReply::text("never reached"),
        ]));
        let gw = gateway(client.clone(), 3);
        assert!(matches!(
            gw.complete(None, "hi").await,
            Err(LlmError::BadRequest(_))
        ));
        assert_eq!(client.call_count(), 1);

        let client = Arc::new(MockLlmClient::scripted([MockReply::Fail(
            LlmError::MissingApiKey("GEMINI_API_KEY".into()),
        )]));
        let gw = gateway(client.clone(), 3);
        assert!(matches!(
            gw.complete(None, "hi").await,
            Err(LlmError::MissingApiKey(_))
        ));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_call_times_out_each_attempt() {
        let client = Arc::new(MockLlmClient::scripted([MockReply::Hang, MockReply::Hang]));
        let gw = gateway(client.clone(), 2);
        let err = gw.complete(None, "hi").await.unwrap_err();
        assert!(matches!(
            err,
            LlmError::RetriesExhausted {
                attempts: 2,
                cause: RetryCause::Timeout,
                ..
            }
        ));
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_opening_is_retried() {
        let client = Arc::new(MockLlmClient::scripted([
            server_error(),
            MockReply::Chunks(vec!["a".into(), "b".into()]),
        ]));
        let gw = gateway(client.clone(), 3);
        let chunks: Vec<String> = gw
            .stream(None, "hi")
            .await
            .unwrap()
            .map(|c| c.unwrap())
            .collect()
            .await;
        assert_eq!(chunks, vec!["a", "b"]);
        assert_eq!(client.call_count(), 2);
    }

    struct Stalling;

    #[async_trait]
    impl LlmClient for Stalling {
        async fn complete(&self, _request: LlmRequest) -> Result<String, LlmError> {
            Ok(String::new())
        }

        async fn stream(&self, _request: LlmRequest) -> Result<TextStream, LlmError> {
            let first = stream::once(async { Ok("first".to_string()) });
            Ok(Box::pin(first.chain(stream::pending())))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_stream_times_out_per_chunk() {
        let gw = ModelGateway::new(Arc::new(Stalling), GatewayOptions::default());
        let items: Vec<Result<String, LlmError>> =
            gw.stream(None, "hi").await.unwrap().collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "first");
        assert!(matches!(items[1], Err(LlmError::Timeout(_))));
    }
}
