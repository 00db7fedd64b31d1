use async_trait::async_trait;

use ryze_core::Version;
use ryze_runtime::GenerationHandle;

use crate::{ApiError, ClearVersionsResponse, GenerateRequest, VersionListResponse};

#[async_trait]
pub trait ApiService: Send + Sync {
    /// Validate the request and start a generation turn.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerationHandle, ApiError>;
    async fn list_versions(&self) -> Result<VersionListResponse, ApiError>;
    async fn get_version(&self, version: u64) -> Result<Version, ApiError>;
    async fn clear_versions(&self) -> Result<ClearVersionsResponse, ApiError>;
}
