//! Entity identifiers
//!
//! Namespaced identities for the entities a deployment touches:
//! - [`ApplicationId`] / [`ApplicationReference`] for applications
//! - [`DatasetId`] for dataset instances
//! - [`KerberosPrincipalId`] for owner principals
//! - [`EntityId`] for owner lookups across both

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version assigned to applications that do not declare one
pub const DEFAULT_VERSION: &str = "-SNAPSHOT";

static ENTITY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("entity id pattern"));

static DATASET_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[$.A-Za-z0-9_-]+$").expect("dataset id pattern"));

static PRINCIPAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^/@\s]+)(/([^/@\s]+))?(@([^/@\s]+))?$").expect("principal pattern")
});

/// Check that a name is usable as an application or program identifier
#[inline]
#[must_use]
pub fn is_valid_id(name: &str) -> bool {
    ENTITY_ID.is_match(name)
}

/// Check that a name is usable as a dataset instance identifier
#[inline]
#[must_use]
pub fn is_valid_dataset_id(name: &str) -> bool {
    DATASET_ID.is_match(name)
}

/// Errors raised while parsing identities
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// Principal does not have the `primary[/instance][@REALM]` shape
    #[error("invalid principal '{0}': expected primary[/instance][@REALM]")]
    InvalidPrincipal(String),
}

/// Application reference (namespace + name, any version)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationReference {
    /// Owning namespace
    pub namespace: String,
    /// Application name
    pub application: String,
}

impl ApplicationReference {
    /// Create new reference
    #[inline]
    #[must_use]
    pub fn new(namespace: impl Into<String>, application: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            application: application.into(),
        }
    }

    /// Pin the reference to a version
    #[inline]
    #[must_use]
    pub fn version(&self, version: impl Into<String>) -> ApplicationId {
        ApplicationId {
            namespace: self.namespace.clone(),
            application: self.application.clone(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ApplicationReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "application:{}.{}", self.namespace, self.application)
    }
}

/// Fully qualified application identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId {
    /// Owning namespace
    pub namespace: String,
    /// Application name
    pub application: String,
    /// Application version
    pub version: String,
}

impl ApplicationId {
    /// Create new application id
    #[inline]
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        application: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            application: application.into(),
            version: version.into(),
        }
    }

    /// Version-less reference to this application
    #[inline]
    #[must_use]
    pub fn app_reference(&self) -> ApplicationReference {
        ApplicationReference::new(&self.namespace, &self.application)
    }

    /// Dataset identity in the same namespace
    #[inline]
    #[must_use]
    pub fn dataset(&self, name: impl Into<String>) -> DatasetId {
        DatasetId::new(&self.namespace, name)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "application:{}.{}.{}",
            self.namespace, self.application, self.version
        )
    }
}

/// Dataset instance identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatasetId {
    /// Owning namespace
    pub namespace: String,
    /// Instance name
    pub dataset: String,
}

impl DatasetId {
    /// Create new dataset id
    #[inline]
    #[must_use]
    pub fn new(namespace: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            dataset: dataset.into(),
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dataset:{}.{}", self.namespace, self.dataset)
    }
}

/// Any entity that can carry an owner principal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityId {
    /// Application (owners are tracked per reference, not per version)
    Application(ApplicationReference),
    /// Dataset instance
    Dataset(DatasetId),
}

impl From<&ApplicationId> for EntityId {
    fn from(id: &ApplicationId) -> Self {
        Self::Application(id.app_reference())
    }
}

impl From<ApplicationReference> for EntityId {
    fn from(reference: ApplicationReference) -> Self {
        Self::Application(reference)
    }
}

impl From<DatasetId> for EntityId {
    fn from(id: DatasetId) -> Self {
        Self::Dataset(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Application(r) => r.fmt(f),
            Self::Dataset(d) => d.fmt(f),
        }
    }
}

/// Kerberos principal requested as the owner of a deployment
///
/// Construction does not validate; call [`KerberosPrincipalId::validate`]
/// before trusting the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KerberosPrincipalId {
    principal: String,
}

impl KerberosPrincipalId {
    /// Wrap a principal string
    #[inline]
    #[must_use]
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
        }
    }

    /// Raw principal string
    #[inline]
    #[must_use]
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Check the `primary[/instance][@REALM]` shape
    ///
    /// # Errors
    /// Returns [`IdError::InvalidPrincipal`] when the string does not parse
    pub fn validate(&self) -> Result<(), IdError> {
        if PRINCIPAL.is_match(&self.principal) {
            Ok(())
        } else {
            Err(IdError::InvalidPrincipal(self.principal.clone()))
        }
    }

    /// Short (primary) component of the principal
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.principal
            .split(['/', '@'])
            .next()
            .unwrap_or(&self.principal)
    }
}

impl fmt::Display for KerberosPrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.principal)
    }
}
