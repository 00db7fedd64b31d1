//! # Ryze Stores
//!
//! Store implementations for the Ryze runtime.
//!
//! This crate provides:
//! - InMemory VersionStore

mod version_store;

pub use version_store::InMemoryVersionStore;

// Re-export core traits for convenience
pub use ryze_core::store::{StoreError, VersionStore};
