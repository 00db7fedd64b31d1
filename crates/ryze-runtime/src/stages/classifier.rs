use serde_json::Value;
use tracing::{debug, info};

use ryze_llm::ModelGateway;

use super::{json_payload, StageError};
use crate::prompts::{classifier_prompt, CLASSIFIER_SYSTEM};

/// What the user wants from this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Build or change a UI.
    Ui,
    /// Plain conversation, answered directly.
    Chat { response: String },
}

/// Decides between UI generation and a direct chat reply.
///
/// Anything short of a well-formed chat answer counts as a UI request.
#[derive(Clone)]
pub struct IntentClassifier {
    gateway: ModelGateway,
}

impl IntentClassifier {
    pub fn new(gateway: ModelGateway) -> Self {
        Self { gateway }
    }

    pub async fn classify(&self, message: &str, has_previous_ui: bool) -> Result<Intent, StageError> {
        let raw = self
            .gateway
            .complete(
                Some(CLASSIFIER_SYSTEM),
                &classifier_prompt(message, has_previous_ui),
            )
            .await?;
        let intent = parse_intent(&raw);
        info!(
            intent = if matches!(intent, Intent::Ui) { "ui" } else { "chat" },
            "request classified"
        );
        Ok(intent)
    }
}

fn parse_intent(raw: &str) -> Intent {
    let value: Value = match serde_json::from_str(&json_payload(raw)) {
        Ok(value) => value,
        Err(err) => {
            debug!(error = %err, "classifier reply is not JSON, treating as ui");
            return Intent::Ui;
        }
    };
    let is_chat = value.get("type").and_then(Value::as_str) == Some("chat");
    let response = value
        .get("response")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty());
    match (is_chat, response) {
        (true, Some(response)) => Intent::Chat {
            response: response.to_string(),
        },
        _ => Intent::Ui,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ryze_llm::{GatewayOptions, MockLlmClient, MockReply};

    #[test]
    fn test_parse_intent() {
        assert_eq!(parse_intent(r#"{"type": "ui"}"#), Intent::Ui);
        assert_eq!(
            parse_intent("```json\n{\"type\": \"chat\", \"response\": \"Hi there!\"}\n```"),
            Intent::Chat {
                response: "Hi there!".to_string()
            }
        );
    }

    #[test]
    fn test_parse_intent_fails_open() {
        assert_eq!(parse_intent("sure, I can help"), Intent::Ui);
        assert_eq!(parse_intent(r#"{"type": "weather"}"#), Intent::Ui);
        assert_eq!(parse_intent(r#"{"type": "chat"}"#), Intent::Ui);
        assert_eq!(parse_intent(r#"{"type": "chat", "response": "   "}"#), Intent::Ui);
        assert_eq!(parse_intent(r#"{"type": "chat", "response": 42}"#), Intent::Ui);
        assert_eq!(parse_intent("[1, 2"), Intent::Ui);
    }

    #[tokio::test]
    async fn test_classify_sends_system_prompt() {
        let client = Arc::new(MockLlmClient::scripted([MockReply::text(
            r#"{"type":"chat","response":"Hello! I build UIs."}"#,
        )]));
        let classifier =
            IntentClassifier::new(ModelGateway::new(client.clone(), GatewayOptions::default()));
        let intent = classifier.classify("hello", false).await.unwrap();
        assert!(matches!(intent, Intent::Chat { .. }));
        let request = &client.requests()[0];
        assert_eq!(request.system, CLASSIFIER_SYSTEM);
        assert!(request.user.contains("\"hello\""));
    }
}
