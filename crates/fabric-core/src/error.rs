//! Error types for Deploy Fabric Core
//!
//! Provides error handling for:
//! - Upload session protocol violations
//! - Archive loading and deployment pipeline failures
//! - Deploy worker pool exhaustion
//! - Session record persistence
//! - Configuration loading

use crate::status::DeployStatus;
use crate::types::AccountId;
use fabric_verify::{StoreError, VerificationError};
use std::path::PathBuf;

/// Top-level error of the deployment service
#[derive(Debug, thiserror::Error)]
pub enum FabricError {
    /// Upload session protocol error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Deployment pipeline error
    #[error(transparent)]
    Deploy(#[from] DeployError),

    /// Session record error
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl FabricError {
    /// Whether the caller sent a request the protocol does not allow
    #[inline]
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Session(SessionError::Conflict(_) | SessionError::NoSession(_) | SessionError::BadRequest(_))
        )
    }
}

/// Upload session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A session is already in progress for the account
    #[error("an upload is already in progress for account {0}")]
    Conflict(AccountId),

    /// No live session for the account
    #[error("no upload session in progress for account {0}")]
    NoSession(AccountId),

    /// Malformed request
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Archive directory or stream failure
    #[error("storage error for account {account}: {source}")]
    Storage {
        /// Account whose session failed
        account: AccountId,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Deploy could not be started
    #[error("deploy could not be started: {0}")]
    Deploy(#[from] DeployError),

    /// Persisted record could not be read
    #[error(transparent)]
    Record(#[from] RecordError),
}

impl From<TransitionError> for SessionError {
    fn from(err: TransitionError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// Illegal session status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("session cannot move from {from} to {to}")]
pub struct TransitionError {
    /// Current status
    pub from: DeployStatus,
    /// Requested status
    pub to: DeployStatus,
}

/// Deployment pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Archive unreadable or its descriptor undecodable
    #[error("cannot load archive {path}: {reason}")]
    Archive {
        /// Archive location
        path: PathBuf,
        /// Why it could not be loaded
        reason: String,
    },

    /// Verification gate failed
    #[error("{0}")]
    Verification(#[from] VerificationError),

    /// Registration with the metadata store failed
    #[error("registration failed: {0}")]
    Registration(#[from] StoreError),

    /// Deploy queue is full
    #[error("deploy queue is full ({0} jobs waiting)")]
    PoolExhausted(usize),

    /// Deploy pool no longer accepts jobs
    #[error("deploy pool is shut down")]
    PoolShutdown,

    /// Result channel dropped before completion
    #[error("deploy was cancelled before completion")]
    Cancelled,
}

impl DeployError {
    /// Create archive error
    #[inline]
    pub fn archive(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Archive {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Check if the failure came from a verification gate
    #[inline]
    #[must_use]
    pub fn is_verification(&self) -> bool {
        matches!(self, Self::Verification(_))
    }
}

/// Session record persistence errors
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// Record file I/O failure
    #[error("session record I/O error at {path}: {source}")]
    Io {
        /// Record file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Account id cannot name a record directory
    #[error("invalid account id '{0}'")]
    InvalidAccount(AccountId),

    /// Record could not be encoded or decoded
    #[error("session record is malformed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_error_is_bad_request() {
        let err: SessionError = TransitionError {
            from: DeployStatus::Verifying,
            to: DeployStatus::Uploading,
        }
        .into();
        assert!(matches!(err, SessionError::BadRequest(ref msg) if msg.contains("VERIFYING")));
    }

    #[test]
    fn client_errors() {
        let conflict: FabricError = SessionError::Conflict(AccountId::new("a")).into();
        assert!(conflict.is_client_error());
        let pool: FabricError = DeployError::PoolShutdown.into();
        assert!(!pool.is_client_error());
    }
}
