//! # Ryze Core
//!
//! Core data model and deterministic logic for the Ryze UI generator.
//!
//! This crate contains:
//! - ComponentNode / PlanOutput / Version / ProgressEvent definitions
//! - The static component whitelist (schema registry)
//! - The tree validator/sanitizer that gates untrusted model output
//! - The tree → code serializer and its code → tree inverse
//! - The VersionStore abstraction
//!
//! This crate does NOT care about:
//! - Which model produced a tree
//! - How progress events reach the user
//! - Where versions are stored

pub mod codegen;
pub mod schema;
pub mod store;
pub mod types;
pub mod validator;

#[cfg(test)]
mod testing;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::codegen::{code_to_tree, parse_code, tree_to_code, ParseError};
    pub use crate::schema::{ComponentSchema, PropKind, PropSchema, SchemaRegistry};
    pub use crate::store::{StoreError, VersionStore};
    pub use crate::types::{
        AgentStep, Child, ComponentNode, Modification, ModificationAction, PlanOutput,
        PlannedComponent, ProgressEvent, Props, Version, VersionSummary,
    };
    pub use crate::validator::{
        validate_component_tree, validate_plan_output, PlanShapeError, TreeValidator,
        ValidationReport,
    };
}

// Re-export key types at crate root
pub use codegen::{code_to_tree, tree_to_code};
pub use schema::SchemaRegistry;
pub use store::{StoreError, VersionStore};
pub use types::{AgentStep, Child, ComponentNode, PlanOutput, ProgressEvent, Props, Version};
pub use validator::{validate_component_tree, TreeValidator, ValidationReport};
