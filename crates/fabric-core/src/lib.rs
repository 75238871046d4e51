//! Deploy Fabric Core
//!
//! Control plane for deploying uploaded application archives.
//!
//! # Core Concepts
//!
//! - [`DeploymentService`]: RPC facade (`init`, `chunk`, `deploy`, `dstatus`)
//! - [`SessionManager`]: per-tenant upload sessions and their lifecycle
//! - [`DeploymentPipeline`]: load, verify and register an archive
//! - [`DeployPool`]: bounded workers running the pipeline off the request path
//! - [`SessionStore`]: persisted terminal session records
//!
//! # Example
//!
//! ```rust,ignore
//! use fabric_core::{AccountId, AuthToken, DeploymentService, FabricConfig, ResourceInfo};
//!
//! let service = DeploymentService::local(FabricConfig::default());
//! let token = AuthToken::new("alice");
//!
//! let resource = service
//!     .init(&token, ResourceInfo::new(AccountId::new("acme"), "app.jar", 42, 0))
//!     .await?;
//! service.chunk(&token, &resource, Some(&bytes)).await?;
//!
//! let deployed = service.deploy(&token, &resource).await?.wait().await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod archive;
mod config;
mod error;
mod pipeline;
mod pool;
mod record;
mod service;
mod session;
mod status;
mod types;

pub use archive::{ArchiveReader, DescriptorFormat, FileArchiveReader};
pub use config::{FabricConfig, DEFAULT_ARCHIVE_DIR, DEFAULT_SESSION_FILE};
pub use error::{ConfigError, DeployError, FabricError, RecordError, SessionError, TransitionError};
pub use pipeline::{
    ApplicationRegistrationStage, ApplicationWithPrograms, DeployJob, DeploymentPipeline, LocalArchiveLoaderStage,
    Stage,
};
pub use pool::{DeployPool, DeployResult, PoolStats};
pub use record::{FileSessionStore, SessionRecord, SessionStore};
pub use service::DeploymentService;
pub use session::{DeployHandle, SessionManager};
pub use status::{allowed_transitions, validate_transition, DeployStatus};
pub use types::{AccountId, AuthToken, DeploymentStatus, ResourceIdentifier, ResourceInfo};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
