use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use ryze_core::{Version, VersionStore};
use ryze_runtime::{GenerationHandle, RuntimeApp};

use crate::{ApiError, ApiService, ClearVersionsResponse, GenerateRequest, VersionListResponse};

/// [`ApiService`] backed by an in-process [`RuntimeApp`].
#[derive(Clone)]
pub struct RuntimeApi {
    app: Arc<RuntimeApp>,
}

impl RuntimeApi {
    pub fn from_config_path(config: impl AsRef<Path>) -> Result<Self, ApiError> {
        let app = RuntimeApp::from_config_path(config)
            .map_err(|err| ApiError::Internal(format!("build runtime app failed: {}", err)))?;
        Ok(Self::new(app))
    }

    pub fn new(app: RuntimeApp) -> Self {
        Self { app: Arc::new(app) }
    }

    pub fn app(&self) -> &Arc<RuntimeApp> {
        &self.app
    }
}

#[async_trait]
impl ApiService for RuntimeApi {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerationHandle, ApiError> {
        let request = request.into_generation()?;
        let request_id = Uuid::new_v4();
        tracing::info!(
            %request_id,
            pro_mode = request.pro_mode,
            has_previous_tree = request.previous_tree.is_some(),
            history = request.history.len(),
            "generation requested"
        );
        Ok(self.app.orchestrator.spawn(request))
    }

    async fn list_versions(&self) -> Result<VersionListResponse, ApiError> {
        let versions = self.app.store.all().await?;
        Ok(VersionListResponse {
            versions: versions.iter().map(Version::summary).collect(),
        })
    }

    async fn get_version(&self, version: u64) -> Result<Version, ApiError> {
        self.app
            .store
            .get(version)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("version {} not found", version)))
    }

    async fn clear_versions(&self) -> Result<ClearVersionsResponse, ApiError> {
        let cleared = self.app.store.clear().await?;
        tracing::info!(cleared, "version history cleared");
        Ok(ClearVersionsResponse {
            success: true,
            cleared,
        })
    }
}
