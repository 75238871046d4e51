//! Deployment service
//!
//! Transport-agnostic RPC surface: `init`, `chunk`, `deploy`, `dstatus`.
//! Every call carries an owner token naming the requesting principal; the
//! tenant is the account of the resource being addressed.

use crate::archive::{ArchiveReader, FileArchiveReader};
use crate::config::FabricConfig;
use crate::error::{FabricError, SessionError};
use crate::pipeline::DeploymentPipeline;
use crate::record::{FileSessionStore, SessionStore};
use crate::session::{DeployHandle, SessionManager};
use crate::types::{AuthToken, DeploymentStatus, ResourceIdentifier, ResourceInfo};
use fabric_verify::{DatasetFramework, MemoryDatasetFramework, MemoryOwnerAdmin, MemoryStore, OwnerAdmin, Store};
use std::sync::Arc;

/// Deployment RPC facade
#[derive(Debug, Clone)]
pub struct DeploymentService {
    sessions: SessionManager,
}

impl DeploymentService {
    /// Create service over a session manager
    #[inline]
    #[must_use]
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }

    /// Service wired to the given collaborators, with file-backed archives
    /// and session records under the configured archive root
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn with_collaborators(
        config: FabricConfig,
        store: Arc<dyn Store>,
        datasets: Arc<dyn DatasetFramework>,
        owner_admin: Arc<dyn OwnerAdmin>,
    ) -> Self {
        let reader: Arc<dyn ArchiveReader> = Arc::new(FileArchiveReader::new());
        let records: Arc<dyn SessionStore> =
            Arc::new(FileSessionStore::new(&config.archive_dir, config.session_file.clone()));
        let pipeline = DeploymentPipeline::new(reader, store, datasets, owner_admin);
        Self::new(SessionManager::new(config, pipeline, records))
    }

    /// Service backed by in-memory metadata, for local runs and tests
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn local(config: FabricConfig) -> Self {
        Self::with_collaborators(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryDatasetFramework::new()),
            Arc::new(MemoryOwnerAdmin::new()),
        )
    }

    /// Underlying session manager
    #[inline]
    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Register an upload
    ///
    /// # Errors
    /// Fails for an empty token or if the account already has a live session
    pub async fn init(&self, token: &AuthToken, info: ResourceInfo) -> Result<ResourceIdentifier, FabricError> {
        check_token(token)?;
        Ok(self.sessions.register(&info.account_id, &info, token.principal()).await?)
    }

    /// Append a chunk; `None` counts as an empty chunk
    ///
    /// # Errors
    /// Fails for an empty token, without a live session, or for an empty chunk
    pub async fn chunk(
        &self,
        token: &AuthToken,
        resource: &ResourceIdentifier,
        bytes: Option<&[u8]>,
    ) -> Result<(), FabricError> {
        check_token(token)?;
        let bytes = bytes.unwrap_or_default();
        Ok(self.sessions.append_chunk(&resource.account_id, bytes).await?)
    }

    /// Finalize the upload and start deployment
    ///
    /// # Errors
    /// Fails for an empty token, without a live session, or if the deploy
    /// cannot be started
    pub async fn deploy(&self, token: &AuthToken, resource: &ResourceIdentifier) -> Result<DeployHandle, FabricError> {
        check_token(token)?;
        Ok(self.sessions.finalize(&resource.account_id).await?)
    }

    /// Live or persisted status of the account's deployment
    ///
    /// # Errors
    /// Fails for an empty token or an unreadable persisted record
    pub async fn dstatus(&self, token: &AuthToken, resource: &ResourceIdentifier) -> Result<DeploymentStatus, FabricError> {
        check_token(token)?;
        Ok(self.sessions.status(&resource.account_id).await?)
    }
}

fn check_token(token: &AuthToken) -> Result<(), SessionError> {
    if token.is_empty() {
        return Err(SessionError::BadRequest("owner token is required".into()));
    }
    Ok(())
}
