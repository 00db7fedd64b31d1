//! Pipeline stages.
//!
//! Each stage builds its prompt, calls the model gateway and turns the raw
//! reply into a typed value. Stages hold no state between calls.

mod classifier;
mod explainer;
mod generator;
mod planner;

use thiserror::Error;

use ryze_llm::LlmError;

pub use classifier::{Intent, IntentClassifier};
pub use explainer::Explainer;
pub use generator::{GeneratedTree, TreeGenerator};
pub use planner::Planner;

/// Characters of raw model output kept in parse errors.
const SNIPPET_CHARS: usize = 200;

/// Stage failures.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Model(#[from] LlmError),
    #[error("planner returned an unusable plan ({reason}): {snippet}")]
    InvalidPlan { reason: String, snippet: String },
    #[error("generator returned invalid JSON: {snippet}")]
    InvalidJson { snippet: String },
    #[error("generator produced an invalid component tree: {}", .errors.join("; "))]
    InvalidTree { errors: Vec<String> },
}

pub(crate) fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_CHARS).collect()
}

/// JSON payload of a model reply, or the trimmed reply when none is found.
pub(crate) fn json_payload(raw: &str) -> String {
    ryze_llm::extract_json(raw).unwrap_or_else(|| raw.trim().to_string())
}
