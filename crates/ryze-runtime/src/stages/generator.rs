use serde_json::Value;
use tracing::{info, warn};

use ryze_core::{ComponentNode, PlanOutput, SchemaRegistry, TreeValidator};
use ryze_llm::ModelGateway;

use super::{json_payload, snippet, StageError};
use crate::prompts::{generator_prompt, pretty_json};

/// Sanitized generator output.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTree {
    pub tree: ComponentNode,
    /// Validation problems that were repaired or dropped.
    pub warnings: Vec<String>,
}

/// Produces a component tree from a plan and gates it through the validator.
#[derive(Clone)]
pub struct TreeGenerator {
    gateway: ModelGateway,
    registry: &'static SchemaRegistry,
}

impl TreeGenerator {
    pub fn new(gateway: ModelGateway) -> Self {
        Self {
            gateway,
            registry: SchemaRegistry::global(),
        }
    }

    pub async fn generate(
        &self,
        plan: &PlanOutput,
        previous_tree: Option<&ComponentNode>,
        pro_mode: bool,
    ) -> Result<GeneratedTree, StageError> {
        let previous = previous_tree.map(pretty_json);
        let prompt = generator_prompt(&pretty_json(plan), previous.as_deref(), pro_mode);
        let raw = self.gateway.complete(None, &prompt).await?;
        let generated = self.sanitize(&raw)?;
        info!(
            nodes = generated.tree.node_count(),
            warning_count = generated.warnings.len(),
            "component tree generated"
        );
        Ok(generated)
    }

    fn sanitize(&self, raw: &str) -> Result<GeneratedTree, StageError> {
        let payload = json_payload(raw);
        let value: Value = serde_json::from_str(&payload).map_err(|_| StageError::InvalidJson {
            snippet: snippet(&payload),
        })?;

        let report = TreeValidator::new(self.registry).validate(&value);
        if !report.errors.is_empty() {
            warn!(
                warning_count = report.errors.len(),
                warnings = ?report.errors,
                "component tree repaired during validation"
            );
        }
        match report.sanitized_tree {
            Some(tree) => Ok(GeneratedTree {
                tree,
                warnings: report.errors,
            }),
            None => Err(StageError::InvalidTree {
                errors: report.errors,
            }),
        }
    }
}
