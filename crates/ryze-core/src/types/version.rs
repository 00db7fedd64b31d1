//! Version type definition

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ComponentNode;

/// A committed result of a full pipeline run.
///
/// Immutable once created; owned by the version store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    /// 1-based sequence number within the current store lifetime.
    pub version: u64,
    pub component_tree: ComponentNode,
    /// Derived code; absent in tree-only mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub explanation: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Listing view of a version without tree or code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub version: u64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub explanation: String,
}

impl Version {
    pub fn summary(&self) -> VersionSummary {
        VersionSummary {
            version: self.version,
            timestamp: self.timestamp,
            explanation: self.explanation.clone(),
        }
    }
}
