//! # Ryze Runtime
//!
//! The generation pipeline and everything needed to run it.
//!
//! This crate provides:
//! - Prompt construction for every stage
//! - Classifier, Planner, Generator and Explainer stages
//! - The Orchestrator state machine with progress events and cancellation
//! - Bootstrap: tracing setup and `RuntimeApp` assembly from config

mod bootstrap;
mod orchestrator;
mod prompts;
pub mod stages;

pub use bootstrap::{init_tracing_if_needed, BootstrapError, RuntimeApp};
pub use orchestrator::{
    ChatTurn, GenerationHandle, GenerationRequest, Orchestrator, OrchestratorConfig,
    OrchestratorError, PipelineOutcome,
};
pub use stages::{GeneratedTree, Intent, StageError};

// Re-export core types for convenience
pub use ryze_core::prelude::*;
pub use tokio_util::sync::CancellationToken;
