//! In-memory collaborators for tests and local runs.
//!
//! Data is lost when the process exits.

use super::{ApplicationRecord, DatasetFramework, OwnerAdmin, Store, StoreResult};
use crate::error::StoreError;
use async_trait::async_trait;
use fabric_spec::{
    ApplicationId, ApplicationReference, DatasetId, DatasetSpecification, EntityId, KerberosPrincipalId,
};
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory application store
#[derive(Debug, Default)]
pub struct MemoryStore {
    applications: RwLock<HashMap<ApplicationId, ApplicationRecord>>,
}

impl MemoryStore {
    /// Create new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored application versions
    #[must_use]
    pub fn len(&self) -> usize {
        self.applications.read().len()
    }

    /// Check if nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.applications.read().is_empty()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn all_app_versions(&self, reference: &ApplicationReference) -> StoreResult<Vec<ApplicationId>> {
        let mut versions: Vec<ApplicationId> = self
            .applications
            .read()
            .keys()
            .filter(|id| id.namespace == reference.namespace && id.application == reference.application)
            .cloned()
            .collect();
        versions.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(versions)
    }

    async fn add_application(&self, record: ApplicationRecord) -> StoreResult<()> {
        self.applications.write().insert(record.app_id.clone(), record);
        Ok(())
    }

    async fn application(&self, app_id: &ApplicationId) -> StoreResult<Option<ApplicationRecord>> {
        Ok(self.applications.read().get(app_id).cloned())
    }
}

/// In-memory dataset registry
///
/// Records the principal of every lookup so callers can check which
/// identity was used. When restricted, lookups by any other principal fail
/// with [`StoreError::Unauthorized`].
#[derive(Debug, Default)]
pub struct MemoryDatasetFramework {
    instances: RwLock<HashMap<DatasetId, (DatasetSpecification, Option<KerberosPrincipalId>)>>,
    lookups: RwLock<Vec<(DatasetId, String)>>,
    allowed: RwLock<Option<String>>,
}

impl MemoryDatasetFramework {
    /// Create new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only allow lookups by `principal`
    #[must_use]
    pub fn restricted_to(self, principal: impl Into<String>) -> Self {
        *self.allowed.write() = Some(principal.into());
        self
    }

    /// Every `(dataset, principal)` lookup seen so far
    #[must_use]
    pub fn lookups(&self) -> Vec<(DatasetId, String)> {
        self.lookups.read().clone()
    }

    /// Check if an instance exists
    #[must_use]
    pub fn contains(&self, id: &DatasetId) -> bool {
        self.instances.read().contains_key(id)
    }
}

#[async_trait]
impl DatasetFramework for MemoryDatasetFramework {
    async fn dataset_spec(&self, id: &DatasetId, as_principal: &str) -> StoreResult<Option<DatasetSpecification>> {
        self.lookups.write().push((id.clone(), as_principal.to_string()));

        if let Some(allowed) = self.allowed.read().as_deref() {
            if allowed != as_principal {
                return Err(StoreError::Unauthorized {
                    principal: as_principal.to_string(),
                    entity: EntityId::Dataset(id.clone()),
                });
            }
        }

        Ok(self.instances.read().get(id).map(|(spec, _)| spec.clone()))
    }

    async fn add_instance(
        &self,
        id: &DatasetId,
        spec: DatasetSpecification,
        owner: Option<&KerberosPrincipalId>,
    ) -> StoreResult<()> {
        let mut instances = self.instances.write();
        if instances.contains_key(id) {
            return Err(StoreError::AlreadyExists(EntityId::Dataset(id.clone())));
        }
        instances.insert(id.clone(), (spec, owner.cloned()));
        Ok(())
    }
}

/// In-memory owner admin
#[derive(Debug, Default)]
pub struct MemoryOwnerAdmin {
    owners: RwLock<HashMap<EntityId, KerberosPrincipalId>>,
    impersonation: RwLock<HashMap<String, KerberosPrincipalId>>,
}

impl MemoryOwnerAdmin {
    /// Create new empty owner admin
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the impersonation principal of a namespace
    #[must_use]
    pub fn with_impersonation(self, namespace: impl Into<String>, principal: KerberosPrincipalId) -> Self {
        self.impersonation.write().insert(namespace.into(), principal);
        self
    }
}

#[async_trait]
impl OwnerAdmin for MemoryOwnerAdmin {
    async fn owner(&self, entity: &EntityId) -> StoreResult<Option<KerberosPrincipalId>> {
        Ok(self.owners.read().get(entity).cloned())
    }

    async fn set_owner(&self, entity: EntityId, owner: KerberosPrincipalId) -> StoreResult<()> {
        self.owners.write().insert(entity, owner);
        Ok(())
    }

    async fn impersonation_principal(&self, namespace: &str) -> StoreResult<Option<KerberosPrincipalId>> {
        Ok(self.impersonation.read().get(namespace).cloned())
    }
}
