//! Scripted LLM client for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream;

use crate::client::{LlmClient, LlmRequest, TextStream};
use crate::error::LlmError;

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    /// Streamed as separate chunks; joined for `complete`.
    Chunks(Vec<String>),
    Fail(LlmError),
    /// Stream that yields the chunks and then fails.
    BrokenStream(Vec<String>, LlmError),
    /// Wait before producing the inner reply.
    Delayed(Duration, Box<MockReply>),
    /// Never answers.
    Hang,
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Mock LLM client
///
/// Replies are consumed in order, one per call. When the script runs out
/// the fallback response is used, if any.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    script: Mutex<VecDeque<MockReply>>,
    fallback: Option<String>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    /// Client that always answers with `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            fallback: Some(response.into()),
            ..Self::default()
        }
    }

    /// Client that plays back `replies` in order.
    pub fn scripted(replies: impl IntoIterator<Item = MockReply>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    fn next_reply(&self, request: LlmRequest) -> Result<MockReply, LlmError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let scripted = self
            .script
            .lock()
            .map_err(|e| LlmError::Response(e.to_string()))?
            .pop_front();
        scripted
            .or_else(|| self.fallback.clone().map(MockReply::Text))
            .ok_or_else(|| LlmError::Response("mock script exhausted".to_string()))
    }
}

async fn settle(mut reply: MockReply) -> MockReply {
    loop {
        match reply {
            MockReply::Delayed(delay, inner) => {
                tokio::time::sleep(delay).await;
                reply = *inner;
            }
            MockReply::Hang => std::future::pending::<()>().await,
            other => return other,
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: LlmRequest) -> Result<String, LlmError> {
        match settle(self.next_reply(request)?).await {
            MockReply::Text(text) => Ok(text),
            MockReply::Chunks(chunks) => Ok(chunks.concat()),
            MockReply::Fail(err) | MockReply::BrokenStream(_, err) => Err(err),
            MockReply::Delayed(..) | MockReply::Hang => {
                Err(LlmError::Response("unsettled mock reply".to_string()))
            }
        }
    }

    async fn stream(&self, request: LlmRequest) -> Result<TextStream, LlmError> {
        let items: Vec<Result<String, LlmError>> = match settle(self.next_reply(request)?).await {
            MockReply::Text(text) => vec![Ok(text)],
            MockReply::Chunks(chunks) => chunks.into_iter().map(Ok).collect(),
            MockReply::Fail(err) => return Err(err),
            MockReply::BrokenStream(chunks, err) => chunks
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(err)))
                .collect(),
            MockReply::Delayed(..) | MockReply::Hang => {
                return Err(LlmError::Response("unsettled mock reply".to_string()))
            }
        };
        Ok(Box::pin(stream::iter(items)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[test]
    fn test_scripted_replies_in_order_then_fallback() {
        tokio_test::block_on(async {
            let client = MockLlmClient::scripted([
                MockReply::text("one"),
                MockReply::Fail(LlmError::BadRequest("two".into())),
            ]);
            assert_eq!(client.complete(LlmRequest::new("", "a")).await.unwrap(), "one");
            assert!(client.complete(LlmRequest::new("", "b")).await.is_err());
            assert!(matches!(
                client.complete(LlmRequest::new("", "c")).await,
                Err(LlmError::Response(_))
            ));
            assert_eq!(client.call_count(), 3);
            assert_eq!(client.requests()[1].user, "b");

            let constant = MockLlmClient::new("same");
            assert_eq!(constant.complete(LlmRequest::new("", "x")).await.unwrap(), "same");
            assert_eq!(constant.complete(LlmRequest::new("", "y")).await.unwrap(), "same");
        });
    }

    #[test]
    fn test_streamed_chunks_and_broken_stream() {
        tokio_test::block_on(async {
            let client = MockLlmClient::scripted([
                MockReply::Chunks(vec!["Hel".into(), "lo".into()]),
                MockReply::BrokenStream(vec!["par".into()], LlmError::Network("reset".into())),
            ]);
            let chunks: Vec<String> = client
                .stream(LlmRequest::new("", "a"))
                .await
                .unwrap()
                .map(|c| c.unwrap())
                .collect()
                .await;
            assert_eq!(chunks, vec!["Hel", "lo"]);

            let items: Vec<Result<String, LlmError>> = client
                .stream(LlmRequest::new("", "b"))
                .await
                .unwrap()
                .collect()
                .await;
            assert_eq!(items.len(), 2);
            assert!(items[1].is_err());
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_reply() {
        let client = MockLlmClient::scripted([MockReply::Delayed(
            Duration::from_secs(5),
            Box::new(MockReply::text("late")),
        )]);
        assert_eq!(client.complete(LlmRequest::new("", "a")).await.unwrap(), "late");
    }
}
