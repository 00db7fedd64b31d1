//! VersionStore in-memory implementation.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

use ryze_core::store::{StoreError, VersionStore};
use ryze_core::types::{ComponentNode, Version};

struct Inner {
    versions: Vec<Version>,
    next: u64,
}

/// In-memory, process-lifetime version log.
///
/// Number assignment and append happen under one lock, so concurrent
/// commits always get distinct, increasing numbers.
pub struct InMemoryVersionStore {
    inner: Mutex<Inner>,
}

impl InMemoryVersionStore {
    /// Create an empty store; the first version is numbered 1.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                versions: Vec::new(),
                next: 1,
            }),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Internal(e.to_string()))
    }
}

impl Default for InMemoryVersionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VersionStore for InMemoryVersionStore {
    async fn add(
        &self,
        component_tree: ComponentNode,
        code: Option<String>,
        explanation: String,
    ) -> Result<Version, StoreError> {
        let mut inner = self.lock()?;
        let version = Version {
            version: inner.next,
            component_tree,
            code,
            explanation,
            timestamp: Utc::now(),
        };
        inner.next += 1;
        inner.versions.push(version.clone());
        tracing::debug!(version = version.version, "version committed");
        Ok(version)
    }

    async fn get(&self, version: u64) -> Result<Option<Version>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .versions
            .iter()
            .find(|v| v.version == version)
            .cloned())
    }

    async fn latest(&self) -> Result<Option<Version>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.versions.last().cloned())
    }

    async fn all(&self) -> Result<Vec<Version>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.versions.clone())
    }

    async fn clear(&self) -> Result<usize, StoreError> {
        let mut inner = self.lock()?;
        let cleared = inner.versions.len();
        inner.versions.clear();
        inner.next = 1;
        tracing::debug!(cleared, "version store cleared");
        Ok(cleared)
    }
}
