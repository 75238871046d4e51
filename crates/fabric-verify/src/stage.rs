//! Application verification stage
//!
//! Runs every gate over a loaded application, in order, and stops at the
//! first failure:
//!
//! 1. Requested owner principal parses
//! 2. Requested owner matches the owner of any prior version
//! 3. Application specification
//! 4. Dataset creation specs, type and owner of existing instances
//! 5. Program specifications
//! 6. Workflow graphs
//! 7. Schedules target declared workflows
//!
//! On success the deployable is handed back unchanged for the next stage.

use crate::deployable::ApplicationDeployable;
use crate::error::VerificationError;
use crate::registry::VerifierRegistry;
use crate::security::{authorizing_user, verify_owner};
use crate::store::{DatasetFramework, OwnerAdmin, Store};
use crate::verifier::SpecRef;
use crate::workflow::WorkflowGraphValidator;
use fabric_spec::EntityId;
use std::sync::Arc;

/// Verification stage of the deployment pipeline
#[derive(Clone)]
pub struct ApplicationVerificationStage {
    registry: Arc<VerifierRegistry>,
    store: Arc<dyn Store>,
    datasets: Arc<dyn DatasetFramework>,
    owner_admin: Arc<dyn OwnerAdmin>,
}

impl std::fmt::Debug for ApplicationVerificationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationVerificationStage")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl ApplicationVerificationStage {
    /// Create new stage over the given collaborators
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        datasets: Arc<dyn DatasetFramework>,
        owner_admin: Arc<dyn OwnerAdmin>,
    ) -> Self {
        Self {
            registry: Arc::new(VerifierRegistry::new()),
            store,
            datasets,
            owner_admin,
        }
    }

    /// With a shared verifier registry
    #[inline]
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<VerifierRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Verifier registry used by this stage
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<VerifierRegistry> {
        &self.registry
    }

    /// Verify a deployable
    ///
    /// # Errors
    /// Returns the [`VerificationError`] of the first gate that fails
    pub async fn process(&self, input: ApplicationDeployable) -> Result<ApplicationDeployable, VerificationError> {
        let app_id = &input.app_id;
        let spec = input.spec.as_ref();
        let owner = input.owner_principal.as_ref();

        tracing::debug!(app = %app_id, "verifying application");

        if let Some(owner) = owner {
            owner.validate()?;
        }

        let versions = self.store.all_app_versions(&app_id.app_reference()).await?;
        if !versions.is_empty() {
            verify_owner(&*self.owner_admin, &EntityId::from(app_id), owner).await?;
        }

        self.registry
            .verify(app_id, SpecRef::Application(spec))
            .into_result()?;

        let authorizing = authorizing_user(&*self.owner_admin, input.namespace(), owner, &input.requester).await?;
        for dataset in spec.datasets.values() {
            self.registry
                .verify(app_id, SpecRef::DatasetCreation(dataset))
                .into_result()?;

            let dataset_id = app_id.dataset(&dataset.instance_name);
            if let Some(existing) = self.datasets.dataset_spec(&dataset_id, &authorizing).await? {
                if existing.type_name != dataset.type_name {
                    return Err(VerificationError::DatasetTypeMismatch {
                        dataset: dataset.instance_name.clone(),
                        type_name: dataset.type_name.clone(),
                    });
                }
                verify_owner(&*self.owner_admin, &EntityId::Dataset(dataset_id), owner).await?;
            }
        }

        for (_, program) in spec.programs() {
            self.registry.verify(app_id, SpecRef::Program(program)).into_result()?;
        }

        for workflow in spec.workflows.values() {
            let report = WorkflowGraphValidator::new(spec, workflow).validate()?;
            tracing::trace!(
                workflow = %workflow.name,
                nodes = report.node_count(),
                warnings = report.warnings.len(),
                "workflow graph valid"
            );
        }

        for schedule in spec.schedules.values() {
            if !spec.workflows.contains_key(&schedule.program_name) {
                return Err(VerificationError::InvalidSchedule {
                    schedule: schedule.name.clone(),
                    workflow: schedule.program_name.clone(),
                    application: spec.name.clone(),
                });
            }
        }

        tracing::info!(app = %app_id, "application verified");
        Ok(input)
    }
}
