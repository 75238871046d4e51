//! Upload session manager
//!
//! Owns every tenant's in-flight deployment, from archive registration
//! through chunked upload to pipeline completion:
//!
//! - At most one live session per account (atomic check-and-insert)
//! - Chunk writes serialized by the session's own async mutex
//! - Finalize hands the archive to the [`DeployPool`] and returns at once
//! - Terminal sessions are persisted and evicted from the live table

use crate::config::{is_plain_file_name, FabricConfig};
use crate::error::{DeployError, SessionError};
use crate::pipeline::{ApplicationWithPrograms, DeployJob, DeploymentPipeline};
use crate::pool::{DeployPool, DeployResult, PoolStats};
use crate::record::{SessionRecord, SessionStore};
use crate::status::{validate_transition, DeployStatus};
use crate::types::{AccountId, DeploymentStatus, ResourceIdentifier, ResourceInfo};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use fabric_spec::KerberosPrincipalId;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::{oneshot, Mutex};

/// In-memory state of one upload
#[derive(Debug)]
struct UploadSession {
    resource: ResourceIdentifier,
    account: AccountId,
    archive_location: PathBuf,
    status: DeployStatus,
    owner_principal: Option<KerberosPrincipalId>,
    requester: String,
    error: Option<String>,
    created_at: DateTime<Utc>,
    /// Opened on the first chunk
    writer: Option<BufWriter<File>>,
}

impl UploadSession {
    fn deployment_status(&self) -> DeploymentStatus {
        match (&self.status, &self.error) {
            (DeployStatus::Failed, Some(reason)) => DeploymentStatus::failed(reason.clone()),
            (status, _) => DeploymentStatus::new(*status),
        }
    }

    fn record(&self) -> SessionRecord {
        SessionRecord {
            resource_identifier: self.resource.clone(),
            account_id: self.account.clone(),
            archive_location: self.archive_location.clone(),
            status: self.status,
            error: self.error.clone(),
            created_at: self.created_at,
            updated_at: Utc::now(),
        }
    }

    fn job(&self) -> DeployJob {
        DeployJob {
            account: self.account.clone(),
            archive_location: self.archive_location.clone(),
            owner_principal: self.owner_principal.clone(),
            requester: self.requester.clone(),
        }
    }
}

/// Completion handle returned by [`SessionManager::finalize`]
#[derive(Debug)]
pub struct DeployHandle {
    resource: ResourceIdentifier,
    receiver: oneshot::Receiver<DeployResult>,
}

impl DeployHandle {
    /// Resource being deployed
    #[inline]
    #[must_use]
    pub fn resource(&self) -> &ResourceIdentifier {
        &self.resource
    }

    /// Wait for the pipeline to finish
    ///
    /// The session's terminal status has been recorded by the time this
    /// returns.
    ///
    /// # Errors
    /// Returns the pipeline's [`DeployError`], or
    /// [`DeployError::Cancelled`] if the result was lost
    pub async fn wait(self) -> Result<ApplicationWithPrograms, DeployError> {
        self.receiver.await.unwrap_or(Err(DeployError::Cancelled))
    }
}

struct Inner {
    config: FabricConfig,
    sessions: DashMap<AccountId, Arc<Mutex<UploadSession>>>,
    pool: DeployPool,
    records: Arc<dyn SessionStore>,
}

/// Per-tenant upload session manager
///
/// Cheap to clone; clones share the same sessions and pool.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("archive_dir", &self.inner.config.archive_dir)
            .field("live_sessions", &self.inner.sessions.len())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create new manager and start its deploy pool
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(config: FabricConfig, pipeline: DeploymentPipeline, records: Arc<dyn SessionStore>) -> Self {
        let pool = DeployPool::new(Arc::new(pipeline), config.deploy_workers, config.queue_capacity);
        Self {
            inner: Arc::new(Inner {
                config,
                sessions: DashMap::new(),
                pool,
                records,
            }),
        }
    }

    /// Service configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &FabricConfig {
        &self.inner.config
    }

    /// Register a new upload for an account
    ///
    /// # Errors
    /// - `SessionError::Conflict` if a session is already live for the account
    /// - `SessionError::BadRequest` if the account id is not a single path
    ///   component, or the file name is not a plain file name or collides
    ///   with the session record
    /// - `SessionError::Storage` if the account directory cannot be created
    pub async fn register(
        &self,
        account: &AccountId,
        info: &ResourceInfo,
        requester: &str,
    ) -> Result<ResourceIdentifier, SessionError> {
        if !account.is_valid() {
            return Err(SessionError::BadRequest(format!("invalid account id '{account}'")));
        }
        let filename = info.filename.as_str();
        if !is_plain_file_name(filename) || self.inner.config.is_reserved_file_name(filename) {
            return Err(SessionError::BadRequest(format!("invalid archive file name '{filename}'")));
        }

        let dir = self.inner.config.account_dir(account);
        let resource = ResourceIdentifier::new(account.clone(), info.application_id());

        match self.inner.sessions.entry(account.clone()) {
            Entry::Occupied(_) => return Err(SessionError::Conflict(account.clone())),
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(Mutex::new(UploadSession {
                    resource: resource.clone(),
                    account: account.clone(),
                    archive_location: dir.join(filename),
                    status: DeployStatus::Registered,
                    owner_principal: info.owner_principal.clone(),
                    requester: requester.to_string(),
                    error: None,
                    created_at: Utc::now(),
                    writer: None,
                })));
            }
        }

        if let Err(source) = tokio::fs::create_dir_all(&dir).await {
            self.inner.sessions.remove(account);
            tracing::error!(%account, dir = %dir.display(), error = %source, "cannot create archive directory");
            return Err(SessionError::Storage {
                account: account.clone(),
                source,
            });
        }

        tracing::info!(%account, resource = %resource, "upload session registered");
        Ok(resource)
    }

    /// Append a chunk to the account's archive
    ///
    /// An empty chunk is a protocol error: the session and its partial
    /// archive are discarded.
    ///
    /// # Errors
    /// - `SessionError::NoSession` if no session is live
    /// - `SessionError::BadRequest` for an empty chunk, or while verifying
    /// - `SessionError::Storage` if the write fails; the session is discarded
    pub async fn append_chunk(&self, account: &AccountId, chunk: &[u8]) -> Result<(), SessionError> {
        let session = self.live(account)?;
        let mut session = session.lock().await;

        validate_transition(session.status, DeployStatus::Uploading)?;

        if chunk.is_empty() {
            self.discard(&mut session).await;
            return Err(SessionError::BadRequest("invalid chunk received".into()));
        }

        if let Err(source) = write_chunk(&mut session, chunk).await {
            tracing::error!(%account, error = %source, "archive write failed");
            self.discard(&mut session).await;
            return Err(SessionError::Storage {
                account: account.clone(),
                source,
            });
        }

        session.status = DeployStatus::Uploading;
        tracing::trace!(%account, bytes = chunk.len(), "chunk appended");
        Ok(())
    }

    /// Close the archive and start the deployment pipeline
    ///
    /// Returns as soon as the job is queued.
    ///
    /// # Errors
    /// - `SessionError::NoSession` if no session is live
    /// - `SessionError::BadRequest` if the session is already verifying
    /// - `SessionError::Storage` / `SessionError::Deploy` if the archive
    ///   cannot be closed or the job cannot be queued; the session is then
    ///   recorded as failed
    pub async fn finalize(&self, account: &AccountId) -> Result<DeployHandle, SessionError> {
        let handle = self.live(account)?;
        let mut session = handle.lock().await;

        validate_transition(session.status, DeployStatus::Verifying)?;
        session.status = DeployStatus::Verifying;

        if let Some(mut writer) = session.writer.take() {
            if let Err(source) = writer.shutdown().await {
                self.fail_now(&mut session, &source.to_string()).await;
                return Err(SessionError::Storage {
                    account: account.clone(),
                    source,
                });
            }
        }

        let receiver = match self.inner.pool.submit(session.job()) {
            Ok(receiver) => receiver,
            Err(err) => {
                self.fail_now(&mut session, &err.to_string()).await;
                return Err(err.into());
            }
        };

        let (reply, done) = oneshot::channel();
        let manager = self.clone();
        let owner = account.clone();
        tokio::spawn(async move {
            let result = receiver.await.unwrap_or(Err(DeployError::Cancelled));
            manager.complete(&owner, &result).await;
            // Caller may have dropped the handle
            let _ = reply.send(result);
        });

        tracing::info!(%account, archive = %session.archive_location.display(), "deploy started");
        Ok(DeployHandle {
            resource: session.resource.clone(),
            receiver: done,
        })
    }

    /// Current status of the account's deployment
    ///
    /// Live session first, then the persisted record, else unknown.
    ///
    /// # Errors
    /// - `SessionError::BadRequest` for an account id that cannot own a session
    /// - `SessionError::Record` if the persisted record is unreadable
    pub async fn status(&self, account: &AccountId) -> Result<DeploymentStatus, SessionError> {
        if !account.is_valid() {
            return Err(SessionError::BadRequest(format!("invalid account id '{account}'")));
        }
        if let Some(session) = self.get(account) {
            return Ok(session.lock().await.deployment_status());
        }
        Ok(self
            .inner
            .records
            .load(account)
            .await?
            .map_or_else(DeploymentStatus::unknown, |record| record.deployment_status()))
    }

    /// Number of live sessions
    #[inline]
    #[must_use]
    pub fn live_sessions(&self) -> usize {
        self.inner.sessions.len()
    }

    /// Check if the account has a live session
    #[inline]
    #[must_use]
    pub fn has_session(&self, account: &AccountId) -> bool {
        self.inner.sessions.contains_key(account)
    }

    /// Deploy pool statistics
    #[inline]
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.inner.pool.stats()
    }

    /// Stop accepting deploy jobs and wait for queued ones
    pub async fn shutdown(&self) {
        self.inner.pool.shutdown().await;
    }

    fn get(&self, account: &AccountId) -> Option<Arc<Mutex<UploadSession>>> {
        self.inner.sessions.get(account).map(|entry| Arc::clone(entry.value()))
    }

    fn live(&self, account: &AccountId) -> Result<Arc<Mutex<UploadSession>>, SessionError> {
        self.get(account).ok_or_else(|| SessionError::NoSession(account.clone()))
    }

    /// Drop a session after a protocol error, deleting its partial archive
    async fn discard(&self, session: &mut UploadSession) {
        debug_assert!(session.status.is_discardable());
        session.writer = None;
        self.inner.sessions.remove(&session.account);

        match tokio::fs::remove_file(&session.archive_location).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(account = %session.account, error = %err, "cannot delete partial archive");
            }
        }
        tracing::info!(account = %session.account, "upload session discarded");
    }

    /// Record a synchronous finalize failure
    async fn fail_now(&self, session: &mut UploadSession, reason: &str) {
        session.status = DeployStatus::Failed;
        session.error = Some(reason.to_string());
        self.persist(session).await;
        self.inner.sessions.remove(&session.account);
    }

    /// Record the pipeline outcome and evict the session
    async fn complete(&self, account: &AccountId, result: &DeployResult) {
        let Some(handle) = self.get(account) else {
            tracing::warn!(%account, "deploy finished without a live session");
            return;
        };
        let mut session = handle.lock().await;

        let (status, error) = match result {
            Ok(_) => (DeployStatus::Deployed, None),
            Err(err) => (DeployStatus::Failed, Some(err.to_string())),
        };
        if let Err(err) = validate_transition(session.status, status) {
            tracing::warn!(%account, error = %err, "unexpected status at completion");
        }
        session.status = status;
        session.error = error;

        self.persist(&session).await;
        self.inner.sessions.remove(account);

        match &session.error {
            None => tracing::info!(%account, "deploy succeeded"),
            Some(reason) => tracing::warn!(%account, %reason, "deploy failed"),
        }
    }

    async fn persist(&self, session: &UploadSession) {
        if let Err(err) = self.inner.records.save(&session.record()).await {
            tracing::warn!(account = %session.account, error = %err, "cannot persist session record");
        }
    }
}

async fn write_chunk(session: &mut UploadSession, chunk: &[u8]) -> std::io::Result<()> {
    if session.writer.is_none() {
        let file = File::create(&session.archive_location).await?;
        session.writer = Some(BufWriter::new(file));
    }
    match session.writer.as_mut() {
        Some(writer) => writer.write_all(chunk).await,
        None => Ok(()),
    }
}
