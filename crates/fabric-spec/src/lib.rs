//! Deploy Fabric Specification Model
//!
//! Typed description of a packaged application, as read out of an uploaded
//! archive:
//!
//! - [`ApplicationSpecification`]: programs, datasets, workflows, schedules
//! - [`WorkflowSpecification`] / [`WorkflowNode`]: workflow execution graphs
//! - [`DatasetCreationSpec`]: datasets to create on deployment
//! - [`ApplicationId`], [`DatasetId`], [`KerberosPrincipalId`]: identities
//!
//! # Example
//!
//! ```rust
//! use fabric_spec::{ApplicationSpecification, ProgramSpecification, ProgramType,
//!     WorkflowNode, WorkflowSpecification};
//!
//! let app = ApplicationSpecification::new("purchases")
//!     .with_program(ProgramSpecification::mapreduce("aggregate"))
//!     .with_workflow(WorkflowSpecification::new(
//!         "nightly",
//!         vec![WorkflowNode::action("run", ProgramType::MapReduce, "aggregate")],
//!     ));
//!
//! assert!(app.has_program(ProgramType::Workflow, "nightly"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod application;
mod dataset;
mod id;
mod program;
mod workflow;

pub use application::{ApplicationSpecification, ScheduleCreationSpec};
pub use dataset::{DatasetCreationSpec, DatasetSpecification};
pub use id::{
    is_valid_dataset_id, is_valid_id, ApplicationId, ApplicationReference, DatasetId, EntityId,
    IdError, KerberosPrincipalId, DEFAULT_VERSION,
};
pub use program::{ProgramLike, ProgramSpecification, ProgramType};
pub use workflow::{ScheduleProgramInfo, WorkflowNode, WorkflowSpecification};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
