//! Store module
//!
//! Storage abstraction for committed versions.
//!
//! Note: Implementations are in ryze-stores crate

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{ComponentNode, Version};

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// VersionStore trait - append-only log of committed versions
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Append a version; the store assigns the next number.
    async fn add(
        &self,
        component_tree: ComponentNode,
        code: Option<String>,
        explanation: String,
    ) -> Result<Version, StoreError>;

    /// Get a version by number
    async fn get(&self, version: u64) -> Result<Option<Version>, StoreError>;

    /// Most recently added version
    async fn latest(&self) -> Result<Option<Version>, StoreError>;

    /// All versions, oldest first
    async fn all(&self) -> Result<Vec<Version>, StoreError>;

    /// Drop every version and restart numbering; returns how many were removed.
    async fn clear(&self) -> Result<usize, StoreError>;
}
