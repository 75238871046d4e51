//! Testing utilities for Deploy Fabric workspace
//!
//! Shared fixtures: sample applications, in-memory collaborators and
//! archive files.

#![allow(missing_docs)]

use fabric_spec::{
    ApplicationId, ApplicationSpecification, DatasetCreationSpec, KerberosPrincipalId,
    ProgramSpecification, ProgramType, WorkflowNode, WorkflowSpecification,
};
use fabric_verify::{
    ApplicationDeployable, ApplicationVerificationStage, MemoryDatasetFramework, MemoryOwnerAdmin,
    MemoryStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const TEST_NAMESPACE: &str = "tenant";
pub const TEST_REQUESTER: &str = "deployer";

pub fn mr(id: &str, program: &str) -> WorkflowNode {
    WorkflowNode::action(id, ProgramType::MapReduce, program)
}

/// Application declaring MapReduce programs `p1`, `p2` and `p3`
pub fn app_with_programs(name: &str) -> ApplicationSpecification {
    ApplicationSpecification::new(name)
        .with_program(ProgramSpecification::mapreduce("p1"))
        .with_program(ProgramSpecification::mapreduce("p2"))
        .with_program(ProgramSpecification::mapreduce("p3"))
}

/// `A`, fork of `[B]` and `[C]`, then condition `D` with `[E]` in its
/// if-branch
pub fn workflow_w() -> WorkflowSpecification {
    WorkflowSpecification::new(
        "W",
        vec![
            mr("A", "p1"),
            WorkflowNode::fork(vec![vec![mr("B", "p2")], vec![mr("C", "p3")]]),
            WorkflowNode::condition("D", vec![mr("E", "p1")], vec![]),
        ],
    )
}

/// [`workflow_w`] with `B` reused in the second fork branch
pub fn workflow_w_duplicate() -> WorkflowSpecification {
    WorkflowSpecification::new(
        "W",
        vec![
            mr("A", "p1"),
            WorkflowNode::fork(vec![vec![mr("B", "p2")], vec![mr("B", "p3")]]),
            WorkflowNode::condition("D", vec![mr("E", "p1")], vec![]),
        ],
    )
}

pub fn app_with_dataset(name: &str, dataset: &str, type_name: &str) -> ApplicationSpecification {
    ApplicationSpecification::new(name).with_dataset(DatasetCreationSpec::new(dataset, type_name))
}

pub fn app_id(name: &str) -> ApplicationId {
    ApplicationId::new(TEST_NAMESPACE, name, "1.0.0")
}

pub fn deployable(spec: ApplicationSpecification) -> ApplicationDeployable {
    let app_id = app_id(&spec.name);
    ApplicationDeployable::new(app_id, spec, "/tmp/test.jar", TEST_REQUESTER)
}

pub fn deployable_owned_by(spec: ApplicationSpecification, owner: &str) -> ApplicationDeployable {
    deployable(spec).with_owner(Some(KerberosPrincipalId::new(owner)))
}

/// In-memory collaborators shared by a test
#[derive(Debug, Default, Clone)]
pub struct TestCollaborators {
    pub store: Arc<MemoryStore>,
    pub datasets: Arc<MemoryDatasetFramework>,
    pub owner_admin: Arc<MemoryOwnerAdmin>,
}

impl TestCollaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_datasets(datasets: MemoryDatasetFramework) -> Self {
        Self {
            datasets: Arc::new(datasets),
            ..Self::default()
        }
    }

    pub fn with_owner_admin(owner_admin: MemoryOwnerAdmin) -> Self {
        Self {
            owner_admin: Arc::new(owner_admin),
            ..Self::default()
        }
    }

    pub fn stage(&self) -> ApplicationVerificationStage {
        ApplicationVerificationStage::new(
            self.store.clone(),
            self.datasets.clone(),
            self.owner_admin.clone(),
        )
    }
}

/// Write `spec` as an `application.json` descriptor under `dir`
pub fn write_archive(dir: &Path, file_name: &str, spec: &ApplicationSpecification) -> PathBuf {
    let path = dir.join(file_name);
    let bytes = serde_json::to_vec_pretty(spec).unwrap();
    std::fs::write(&path, bytes).unwrap();
    path
}

/// JSON descriptor bytes of `spec`
pub fn archive_bytes(spec: &ApplicationSpecification) -> Vec<u8> {
    serde_json::to_vec(spec).unwrap()
}
