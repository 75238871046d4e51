//! Persisted session records
//!
//! A terminal session is written as JSON to
//! `<archive_dir>/<account>/<session_file>` so its status survives eviction
//! from the live table and process restarts.

use crate::error::RecordError;
use crate::status::DeployStatus;
use crate::types::{AccountId, DeploymentStatus, ResourceIdentifier};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Durable view of an upload session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Resource the session uploaded
    pub resource_identifier: ResourceIdentifier,
    /// Owning account
    pub account_id: AccountId,
    /// Where the archive was written
    pub archive_location: PathBuf,
    /// Terminal status
    pub status: DeployStatus,
    /// Failure reason when `FAILED`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Session registration time
    pub created_at: DateTime<Utc>,
    /// Time the record was written
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Status reply for this record
    #[must_use]
    pub fn deployment_status(&self) -> DeploymentStatus {
        match (&self.status, &self.error) {
            (DeployStatus::Failed, Some(reason)) => DeploymentStatus::failed(reason.clone()),
            (status, _) => DeploymentStatus::new(*status),
        }
    }
}

/// Storage for terminal session records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a record, replacing the account's previous one
    async fn save(&self, record: &SessionRecord) -> Result<(), RecordError>;

    /// Latest record of an account, if any
    async fn load(&self, account: &AccountId) -> Result<Option<SessionRecord>, RecordError>;
}

/// JSON files under the archive root
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    root: PathBuf,
    file_name: String,
}

impl FileSessionStore {
    /// Create new store rooted at the archive directory
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            file_name: file_name.into(),
        }
    }

    /// Record location for an account
    ///
    /// # Errors
    /// Returns [`RecordError::InvalidAccount`] if the account id would
    /// resolve outside the root
    pub fn path_for(&self, account: &AccountId) -> Result<PathBuf, RecordError> {
        if !account.is_valid() {
            return Err(RecordError::InvalidAccount(account.clone()));
        }
        Ok(self.root.join(account.as_str()).join(&self.file_name))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> RecordError + '_ {
    move |source| RecordError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, record: &SessionRecord) -> Result<(), RecordError> {
        let path = self.path_for(&record.account_id)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error(parent))?;
        }

        let bytes = serde_json::to_vec_pretty(record)?;
        let tmp = path.with_file_name(format!("{}.tmp", self.file_name));
        tokio::fs::write(&tmp, bytes).await.map_err(io_error(&tmp))?;
        tokio::fs::rename(&tmp, &path).await.map_err(io_error(&path))?;

        tracing::debug!(account = %record.account_id, status = %record.status, "session record saved");
        Ok(())
    }

    async fn load(&self, account: &AccountId) -> Result<Option<SessionRecord>, RecordError> {
        let path = self.path_for(account)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(&path)(err)),
        }
    }
}
