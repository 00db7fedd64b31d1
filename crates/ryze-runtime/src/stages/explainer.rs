use ryze_core::{ComponentNode, PlanOutput};
use ryze_llm::{strip_code_fences, ModelGateway, TextStream};

use super::StageError;
use crate::prompts::{explainer_prompt, pretty_json};

/// Describes a generated tree in a few plain sentences.
#[derive(Clone)]
pub struct Explainer {
    gateway: ModelGateway,
}

impl Explainer {
    pub fn new(gateway: ModelGateway) -> Self {
        Self { gateway }
    }

    fn prompt(
        plan: &PlanOutput,
        previous_tree: Option<&ComponentNode>,
        tree: &ComponentNode,
    ) -> String {
        let previous = previous_tree.map(pretty_json);
        explainer_prompt(&pretty_json(plan), previous.as_deref(), &pretty_json(tree))
    }

    /// Single-shot explanation with code fences removed.
    pub async fn explain(
        &self,
        plan: &PlanOutput,
        previous_tree: Option<&ComponentNode>,
        tree: &ComponentNode,
    ) -> Result<String, StageError> {
        let raw = self
            .gateway
            .complete(None, &Self::prompt(plan, previous_tree, tree))
            .await?;
        Ok(strip_code_fences(&raw))
    }

    /// Raw explanation chunks in arrival order.
    ///
    /// Callers clean up the joined text with [`strip_code_fences`].
    pub async fn explain_stream(
        &self,
        plan: &PlanOutput,
        previous_tree: Option<&ComponentNode>,
        tree: &ComponentNode,
    ) -> Result<TextStream, StageError> {
        Ok(self
            .gateway
            .stream(None, &Self::prompt(plan, previous_tree, tree))
            .await?)
    }
}
