use serde_json::Value;
use tracing::{debug, info};

use ryze_core::validator::validate_plan_output;
use ryze_core::{ComponentNode, PlanOutput};
use ryze_llm::ModelGateway;

use super::{json_payload, snippet, StageError};
use crate::orchestrator::ChatTurn;
use crate::prompts::{planner_prompt, pretty_json};

/// Turns a request into a [`PlanOutput`].
#[derive(Clone)]
pub struct Planner {
    gateway: ModelGateway,
}

impl Planner {
    pub fn new(gateway: ModelGateway) -> Self {
        Self { gateway }
    }

    pub async fn plan(
        &self,
        message: &str,
        previous_tree: Option<&ComponentNode>,
        pro_mode: bool,
        history: &[ChatTurn],
    ) -> Result<PlanOutput, StageError> {
        let previous = previous_tree.map(pretty_json);
        let prompt = planner_prompt(message, previous.as_deref(), pro_mode, history);
        let raw = self.gateway.complete(None, &prompt).await?;
        let plan = parse_plan(&raw)?;
        info!(
            components = plan.components.len(),
            modifications = plan.modifications.len(),
            incremental = previous_tree.is_some(),
            "plan created"
        );
        Ok(plan)
    }
}

fn parse_plan(raw: &str) -> Result<PlanOutput, StageError> {
    let payload = json_payload(raw);
    let value: Value = serde_json::from_str(&payload).map_err(|err| {
        debug!(error = %err, "planner reply is not JSON");
        StageError::InvalidPlan {
            reason: "invalid JSON".to_string(),
            snippet: snippet(&payload),
        }
    })?;
    validate_plan_output(&value).map_err(|err| StageError::InvalidPlan {
        reason: err.to_string(),
        snippet: snippet(&payload),
    })
}
