//! Progress event definitions
//!
//! Every field of a progress event is independently optional; consumers
//! accumulate chunk fields themselves.

use serde::{Deserialize, Serialize};

use super::{ComponentNode, PlanOutput};

/// Pipeline step label used as a progress marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStep {
    Planning,
    PlanComplete,
    Generating,
    GenerateComplete,
    Explaining,
    Complete,
    Error,
}

impl AgentStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::PlanComplete => "plan_complete",
            Self::Generating => "generating",
            Self::GenerateComplete => "generate_complete",
            Self::Explaining => "explaining",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }

    /// Whether this step ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// One unit of the server-push progress stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<AgentStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_chunk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation_chunk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_tree: Option<ComponentNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    /// Validation warnings recorded while sanitizing the generated tree.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_response: Option<String>,
}

impl ProgressEvent {
    /// Phase-transition event with a human-readable message.
    pub fn step(step: AgentStep, message: impl Into<String>) -> Self {
        Self {
            step: Some(step),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Terminal error event.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            step: Some(AgentStep::Error),
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Terminal event of a chat-only turn.
    pub fn direct_response(response: impl Into<String>) -> Self {
        Self {
            step: Some(AgentStep::Complete),
            direct_response: Some(response.into()),
            ..Self::default()
        }
    }

    pub fn explanation_chunk(chunk: impl Into<String>) -> Self {
        Self {
            explanation_chunk: Some(chunk.into()),
            ..Self::default()
        }
    }

    pub fn code_chunk(chunk: impl Into<String>) -> Self {
        Self {
            code_chunk: Some(chunk.into()),
            ..Self::default()
        }
    }

    pub fn with_plan(mut self, plan: PlanOutput) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn with_tree(mut self, tree: ComponentNode) -> Self {
        self.component_tree = Some(tree);
        self
    }

    pub fn with_code(mut self, code: Option<String>) -> Self {
        self.code = code;
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.step.map(|s| s.is_terminal()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_serializes_only_present_fields() {
        let event = ProgressEvent::step(AgentStep::PlanComplete, "Plan created.");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"step":"plan_complete","message":"Plan created."})
        );

        let chunk = ProgressEvent::explanation_chunk("Hello");
        assert_eq!(
            serde_json::to_value(&chunk).unwrap(),
            json!({"explanationChunk":"Hello"})
        );
    }

    #[test]
    fn test_terminal_steps() {
        assert!(ProgressEvent::error("boom").is_terminal());
        assert!(ProgressEvent::direct_response("hi").is_terminal());
        assert!(!ProgressEvent::step(AgentStep::Explaining, "...").is_terminal());
    }
}
