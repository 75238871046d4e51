//! Deployment pipeline
//!
//! `LocalArchiveLoaderStage → ApplicationVerificationStage →
//! ApplicationRegistrationStage`. Each stage consumes the previous stage's
//! output; the first error aborts the run.

use crate::archive::ArchiveReader;
use crate::error::DeployError;
use crate::types::AccountId;
use async_trait::async_trait;
use fabric_spec::{
    ApplicationId, ApplicationSpecification, DatasetSpecification, EntityId, KerberosPrincipalId, ProgramLike,
    ProgramType,
};
use fabric_verify::{
    ApplicationDeployable, ApplicationRecord, ApplicationVerificationStage, DatasetFramework, OwnerAdmin,
    Store, StoreError,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Instrument;

/// One step of the deployment pipeline
#[async_trait]
pub trait Stage: Send + Sync {
    /// Input consumed by the stage
    type Input: Send + 'static;
    /// Output handed to the next stage
    type Output: Send + 'static;

    /// Stage name for logs
    fn name(&self) -> &'static str;

    /// Run the stage
    async fn process(&self, input: Self::Input) -> Result<Self::Output, DeployError>;
}

/// Deploy request handed to the worker pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployJob {
    /// Account deploying
    pub account: AccountId,
    /// Uploaded archive
    pub archive_location: PathBuf,
    /// Requested owner
    pub owner_principal: Option<KerberosPrincipalId>,
    /// Principal that finalized the upload
    pub requester: String,
}

/// A registered application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationWithPrograms {
    /// Registered identity
    pub app_id: ApplicationId,
    /// Registered specification
    pub spec: Arc<ApplicationSpecification>,
    /// Archive it was deployed from
    pub archive_location: PathBuf,
    /// Every runnable program, by kind and name
    pub programs: Vec<(ProgramType, String)>,
}

/// Loads the specification out of the uploaded archive
#[derive(Clone)]
pub struct LocalArchiveLoaderStage {
    reader: Arc<dyn ArchiveReader>,
}

impl LocalArchiveLoaderStage {
    /// Create new loader over a reader
    #[must_use]
    pub fn new(reader: Arc<dyn ArchiveReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl Stage for LocalArchiveLoaderStage {
    type Input = DeployJob;
    type Output = ApplicationDeployable;

    fn name(&self) -> &'static str {
        "load-archive"
    }

    async fn process(&self, job: DeployJob) -> Result<ApplicationDeployable, DeployError> {
        let spec = self.reader.read_specification(&job.archive_location).await?;
        let app_id = ApplicationId::new(job.account.as_str(), &spec.name, &spec.version);
        Ok(ApplicationDeployable::new(app_id, spec, job.archive_location, job.requester).with_owner(job.owner_principal))
    }
}

#[async_trait]
impl Stage for ApplicationVerificationStage {
    type Input = ApplicationDeployable;
    type Output = ApplicationDeployable;

    fn name(&self) -> &'static str {
        "verify"
    }

    async fn process(&self, input: ApplicationDeployable) -> Result<ApplicationDeployable, DeployError> {
        Ok(ApplicationVerificationStage::process(self, input).await?)
    }
}

/// Records a verified application and creates its datasets
#[derive(Clone)]
pub struct ApplicationRegistrationStage {
    store: Arc<dyn Store>,
    datasets: Arc<dyn DatasetFramework>,
    owner_admin: Arc<dyn OwnerAdmin>,
}

impl ApplicationRegistrationStage {
    /// Create new registration stage
    #[must_use]
    pub fn new(store: Arc<dyn Store>, datasets: Arc<dyn DatasetFramework>, owner_admin: Arc<dyn OwnerAdmin>) -> Self {
        Self {
            store,
            datasets,
            owner_admin,
        }
    }
}

#[async_trait]
impl Stage for ApplicationRegistrationStage {
    type Input = ApplicationDeployable;
    type Output = ApplicationWithPrograms;

    fn name(&self) -> &'static str {
        "register"
    }

    async fn process(&self, input: ApplicationDeployable) -> Result<ApplicationWithPrograms, DeployError> {
        let owner = input.owner_principal.clone();

        for dataset in input.spec.datasets.values() {
            let id = input.app_id.dataset(&dataset.instance_name);
            match self
                .datasets
                .add_instance(&id, DatasetSpecification::from(dataset), owner.as_ref())
                .await
            {
                Ok(()) => {
                    tracing::debug!(dataset = %id, "dataset instance created");
                    if let Some(owner) = &owner {
                        self.owner_admin.set_owner(EntityId::Dataset(id), owner.clone()).await?;
                    }
                }
                Err(StoreError::AlreadyExists(_)) => {
                    tracing::debug!(dataset = %id, "dataset instance already exists");
                }
                Err(err) => return Err(err.into()),
            }
        }

        if let Some(previous) = self.store.application(&input.app_id).await? {
            tracing::info!(
                app = %input.app_id,
                previous = %previous.archive_location.display(),
                "replacing deployed version"
            );
        }
        self.store
            .add_application(ApplicationRecord {
                app_id: input.app_id.clone(),
                spec: input.spec.as_ref().clone(),
                archive_location: input.archive_location.clone(),
                owner: owner.clone(),
            })
            .await?;
        if let Some(owner) = owner {
            self.owner_admin.set_owner(EntityId::from(&input.app_id), owner).await?;
        }

        let programs = input
            .spec
            .programs()
            .map(|(name, program)| (program.program_type(), name.to_string()))
            .collect();

        Ok(ApplicationWithPrograms {
            app_id: input.app_id,
            spec: input.spec,
            archive_location: input.archive_location,
            programs,
        })
    }
}

/// The three deployment stages, in order
#[derive(Clone)]
pub struct DeploymentPipeline {
    loader: LocalArchiveLoaderStage,
    verifier: ApplicationVerificationStage,
    registrar: ApplicationRegistrationStage,
}

impl std::fmt::Debug for DeploymentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentPipeline")
            .field("stages", &[self.loader.name(), Stage::name(&self.verifier), self.registrar.name()])
            .finish()
    }
}

impl DeploymentPipeline {
    /// Build the pipeline over shared collaborators
    #[must_use]
    pub fn new(
        reader: Arc<dyn ArchiveReader>,
        store: Arc<dyn Store>,
        datasets: Arc<dyn DatasetFramework>,
        owner_admin: Arc<dyn OwnerAdmin>,
    ) -> Self {
        Self {
            loader: LocalArchiveLoaderStage::new(reader),
            verifier: ApplicationVerificationStage::new(store.clone(), datasets.clone(), owner_admin.clone()),
            registrar: ApplicationRegistrationStage::new(store, datasets, owner_admin),
        }
    }

    /// Run every stage over a job
    ///
    /// # Errors
    /// Returns the [`DeployError`] of the first failing stage
    pub async fn run(&self, job: DeployJob) -> Result<ApplicationWithPrograms, DeployError> {
        let span = tracing::info_span!("deploy", account = %job.account);
        async move {
            let deployable = run_stage(&self.loader, job).await?;
            let verified = run_stage(&self.verifier, deployable).await?;
            let registered = run_stage(&self.registrar, verified).await?;
            tracing::info!(app = %registered.app_id, programs = registered.programs.len(), "application deployed");
            Ok(registered)
        }
        .instrument(span)
        .await
    }
}

async fn run_stage<S: Stage>(stage: &S, input: S::Input) -> Result<S::Output, DeployError> {
    tracing::debug!(stage = stage.name(), "stage started");
    let result = stage.process(input).await;
    if let Err(err) = &result {
        tracing::warn!(stage = stage.name(), error = %err, "stage failed");
    }
    result
}
