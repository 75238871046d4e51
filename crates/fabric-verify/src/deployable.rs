//! Artifact flowing through the deployment pipeline

use fabric_spec::{ApplicationId, ApplicationSpecification, KerberosPrincipalId};
use std::path::PathBuf;
use std::sync::Arc;

/// A loaded archive ready for verification and registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDeployable {
    /// Identity the application is deployed under
    pub app_id: ApplicationId,
    /// Specification read out of the archive
    pub spec: Arc<ApplicationSpecification>,
    /// Where the archive lives on disk
    pub archive_location: PathBuf,
    /// Owner requested for the deployment
    pub owner_principal: Option<KerberosPrincipalId>,
    /// Principal that asked for the deployment
    pub requester: String,
}

impl ApplicationDeployable {
    /// Create new deployable without a requested owner
    #[must_use]
    pub fn new(
        app_id: ApplicationId,
        spec: ApplicationSpecification,
        archive_location: impl Into<PathBuf>,
        requester: impl Into<String>,
    ) -> Self {
        Self {
            app_id,
            spec: Arc::new(spec),
            archive_location: archive_location.into(),
            owner_principal: None,
            requester: requester.into(),
        }
    }

    /// With requested owner principal
    #[inline]
    #[must_use]
    pub fn with_owner(mut self, owner: Option<KerberosPrincipalId>) -> Self {
        self.owner_principal = owner;
        self
    }

    /// Namespace the application is deployed into
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.app_id.namespace
    }
}
