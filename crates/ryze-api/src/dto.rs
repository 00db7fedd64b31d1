use serde::{Deserialize, Serialize};
use serde_json::Value;

use ryze_core::validate_component_tree;
use ryze_core::types::VersionSummary;
use ryze_runtime::{ChatTurn, GenerationRequest};

use crate::ApiError;

/// Body of a generation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub message: Option<String>,
    /// Tree to modify; untrusted, so it goes through the validator.
    #[serde(default)]
    pub previous_tree: Option<Value>,
    #[serde(default)]
    pub pro_mode: Option<bool>,
    #[serde(default)]
    pub conversation_history: Vec<ChatTurn>,
}

impl GenerateRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Check the request and turn it into a pipeline input.
    pub fn into_generation(self) -> Result<GenerationRequest, ApiError> {
        let message = self
            .message
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| ApiError::InvalidArgument("message is required".to_string()))?;

        let previous_tree = match self.previous_tree {
            None | Some(Value::Null) => None,
            Some(value) => {
                let report = validate_component_tree(&value);
                let tree = report.sanitized_tree.ok_or_else(|| {
                    ApiError::InvalidArgument(format!(
                        "previousTree is not a component tree: {}",
                        report.errors.join("; ")
                    ))
                })?;
                Some(tree)
            }
        };

        Ok(GenerationRequest {
            message,
            previous_tree,
            pro_mode: self.pro_mode.unwrap_or(false),
            history: self.conversation_history,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionListResponse {
    pub versions: Vec<VersionSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearVersionsResponse {
    pub success: bool,
    pub cleared: usize,
}
