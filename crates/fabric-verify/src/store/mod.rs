//! Collaborator seams
//!
//! The verification and registration stages only see existing deployment
//! state through these traits:
//!
//! - [`Store`]: application metadata
//! - [`DatasetFramework`]: dataset instances, looked up as a principal
//! - [`OwnerAdmin`]: owner principals and namespace impersonation
//!
//! In-memory implementations live in [`memory`].

pub mod memory;

pub use memory::{MemoryDatasetFramework, MemoryOwnerAdmin, MemoryStore};

use crate::error::StoreError;
use async_trait::async_trait;
use fabric_spec::{
    ApplicationId, ApplicationReference, ApplicationSpecification, DatasetId, DatasetSpecification,
    EntityId, KerberosPrincipalId,
};
use std::path::PathBuf;

/// Result alias for collaborator calls
pub type StoreResult<T> = Result<T, StoreError>;

/// Stored metadata for one application version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRecord {
    /// Application version identity
    pub app_id: ApplicationId,
    /// Registered specification
    pub spec: ApplicationSpecification,
    /// Archive the version was deployed from
    pub archive_location: PathBuf,
    /// Owner of record, when one was requested
    pub owner: Option<KerberosPrincipalId>,
}

/// Application metadata store
#[async_trait]
pub trait Store: Send + Sync {
    /// Every deployed version of an application
    async fn all_app_versions(&self, reference: &ApplicationReference) -> StoreResult<Vec<ApplicationId>>;

    /// Record an application version, replacing any previous record of it
    async fn add_application(&self, record: ApplicationRecord) -> StoreResult<()>;

    /// Look up one application version
    async fn application(&self, app_id: &ApplicationId) -> StoreResult<Option<ApplicationRecord>>;
}

/// Dataset instance registry
#[async_trait]
pub trait DatasetFramework: Send + Sync {
    /// Specification of an existing dataset, read as `as_principal`
    async fn dataset_spec(&self, id: &DatasetId, as_principal: &str) -> StoreResult<Option<DatasetSpecification>>;

    /// Create a dataset instance
    ///
    /// Fails with [`StoreError::AlreadyExists`] when the instance exists.
    async fn add_instance(
        &self,
        id: &DatasetId,
        spec: DatasetSpecification,
        owner: Option<&KerberosPrincipalId>,
    ) -> StoreResult<()>;
}

/// Owner principal bookkeeping
#[async_trait]
pub trait OwnerAdmin: Send + Sync {
    /// Owner of record for an entity
    async fn owner(&self, entity: &EntityId) -> StoreResult<Option<KerberosPrincipalId>>;

    /// Record the owner of an entity
    async fn set_owner(&self, entity: EntityId, owner: KerberosPrincipalId) -> StoreResult<()>;

    /// Principal configured for impersonation in a namespace
    async fn impersonation_principal(&self, namespace: &str) -> StoreResult<Option<KerberosPrincipalId>>;
}
