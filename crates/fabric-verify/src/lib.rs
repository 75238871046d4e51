//! Deploy Fabric Verification
//!
//! Decision logic that runs between loading an uploaded archive and
//! registering the application it contains.
//!
//! # Core Concepts
//!
//! - [`ApplicationVerificationStage`]: ordered ownership and specification gates
//! - [`VerifierRegistry`]: one cached verifier per [`SpecKind`]
//! - [`WorkflowGraphValidator`]: structural checks over workflow node trees
//! - [`Store`], [`DatasetFramework`], [`OwnerAdmin`]: existing-state seams
//!
//! # Example
//!
//! ```rust,ignore
//! use fabric_verify::{ApplicationVerificationStage, MemoryDatasetFramework,
//!     MemoryOwnerAdmin, MemoryStore};
//! use std::sync::Arc;
//!
//! let stage = ApplicationVerificationStage::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemoryDatasetFramework::new()),
//!     Arc::new(MemoryOwnerAdmin::new()),
//! );
//!
//! let verified = stage.process(deployable).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod deployable;
mod error;
mod registry;
mod security;
mod stage;
pub mod store;
mod verifier;
mod workflow;

pub use deployable::ApplicationDeployable;
pub use error::{AuthorizationError, GraphError, StoreError, VerificationError};
pub use registry::VerifierRegistry;
pub use security::{authorizing_user, verify_owner};
pub use stage::ApplicationVerificationStage;
pub use store::{
    ApplicationRecord, DatasetFramework, MemoryDatasetFramework, MemoryOwnerAdmin, MemoryStore,
    OwnerAdmin, Store, StoreResult,
};
pub use verifier::{
    ApplicationVerifier, DatasetCreationSpecVerifier, ProgramVerifier, SpecKind,
    SpecRef, SpecVerifier, VerifyResult,
};
pub use workflow::{GraphReport, WorkflowGraphValidator};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
