//! Core types for Deploy Fabric
//!
//! Identities and messages exchanged over the deployment RPC surface:
//! - Account (tenant) identifiers
//! - Resource identifiers and upload metadata
//! - Owner tokens
//! - Deployment status replies

use crate::status::DeployStatus;
use fabric_spec::{is_valid_id, KerberosPrincipalId};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Tenant identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as str
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check the id is usable as a single directory name under the archive
    /// root
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        is_valid_id(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one uploaded resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    /// Owning account
    pub account_id: AccountId,
    /// Application the resource belongs to
    pub application_id: String,
    /// Fresh per upload session
    pub resource_id: Ulid,
    /// Resource version
    pub version: u32,
}

impl ResourceIdentifier {
    /// Create new identifier at version 1
    #[must_use]
    pub fn new(account_id: AccountId, application_id: impl Into<String>) -> Self {
        Self {
            account_id,
            application_id: application_id.into(),
            resource_id: Ulid::new(),
            version: 1,
        }
    }
}

impl std::fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}@{}",
            self.account_id, self.application_id, self.resource_id, self.version
        )
    }
}

/// Metadata sent when registering an upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    /// Owning account
    pub account_id: AccountId,
    /// Archive file name inside the account directory
    pub filename: String,
    /// Declared size in bytes
    pub size: u64,
    /// Modification time, milliseconds since the epoch
    pub modtime: i64,
    /// Owner requested for the deployment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_principal: Option<KerberosPrincipalId>,
}

impl ResourceInfo {
    /// Create new resource info
    #[must_use]
    pub fn new(account_id: AccountId, filename: impl Into<String>, size: u64, modtime: i64) -> Self {
        Self {
            account_id,
            filename: filename.into(),
            size,
            modtime,
            owner_principal: None,
        }
    }

    /// With requested owner principal
    #[inline]
    #[must_use]
    pub fn with_owner(mut self, owner: KerberosPrincipalId) -> Self {
        self.owner_principal = Some(owner);
        self
    }

    /// Application name derived from the file name
    #[must_use]
    pub fn application_id(&self) -> &str {
        self.filename
            .rsplit_once('.')
            .map_or(self.filename.as_str(), |(stem, _)| stem)
    }
}

/// Owner token presented with every call; names the requesting principal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a token
    #[inline]
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Check if the token carries nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Requesting principal
    #[inline]
    #[must_use]
    pub fn principal(&self) -> &str {
        self.0.trim()
    }
}

/// Status reply for a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentStatus {
    /// Lifecycle state
    pub status: DeployStatus,
    /// Human-readable message; the failure reason when `FAILED`
    pub message: String,
}

impl DeploymentStatus {
    /// Status with its default message
    #[must_use]
    pub fn new(status: DeployStatus) -> Self {
        Self {
            status,
            message: status.message().to_string(),
        }
    }

    /// Failed status carrying the reason
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: DeployStatus::Failed,
            message: reason.into(),
        }
    }

    /// No live or persisted session
    #[inline]
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(DeployStatus::Unknown)
    }

    /// Numeric wire code
    #[inline]
    #[must_use]
    pub fn code(&self) -> i32 {
        self.status.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_identifier_starts_at_version_one() {
        let a = ResourceIdentifier::new(AccountId::new("acme"), "app");
        let b = ResourceIdentifier::new(AccountId::new("acme"), "app");
        assert_eq!(a.version, 1);
        assert_ne!(a.resource_id, b.resource_id);
    }

    #[test]
    fn account_ids_are_single_path_components() {
        assert!(AccountId::new("tenant-0").is_valid());
        assert!(AccountId::new("acme_corp").is_valid());
        for bad in ["", ".", "..", "../escaped", "x/../acme", "a\\b", "acme corp"] {
            assert!(!AccountId::new(bad).is_valid(), "{bad}");
        }
    }

    #[test]
    fn application_id_from_filename() {
        let info = ResourceInfo::new(AccountId::new("acme"), "purchases.jar", 10, 0);
        assert_eq!(info.application_id(), "purchases");
        let bare = ResourceInfo::new(AccountId::new("acme"), "purchases", 10, 0);
        assert_eq!(bare.application_id(), "purchases");
    }

    #[test]
    fn blank_token_is_empty() {
        assert!(AuthToken::new("  ").is_empty());
        assert_eq!(AuthToken::new(" alice ").principal(), "alice");
    }

    #[test]
    fn unknown_status_code() {
        let status = DeploymentStatus::unknown();
        assert_eq!(status.code(), 0);
        assert_eq!(status.message, "Not found");
    }
}
