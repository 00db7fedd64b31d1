//! Core type definitions
//!
//! - ComponentNode: the UI tree, single source of truth for code and previews
//! - PlanOutput: intermediate planner artifact
//! - Version: committed pipeline result
//! - ProgressEvent: one unit of the progress stream

mod event;
mod node;
mod plan;
mod version;

pub use event::{AgentStep, ProgressEvent};
pub use node::{Child, ComponentNode, Props};
pub use plan::{Modification, ModificationAction, PlanOutput, PlannedComponent};
pub use version::{Version, VersionSummary};
