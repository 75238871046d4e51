//! Workflow specifications
//!
//! A workflow is an ordered list of [`WorkflowNode`]s. Forks and conditions
//! nest further node lists, so the whole graph is a tree of sequences.

use crate::program::{ProgramLike, ProgramType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Program invoked by an action node or targeted by a schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleProgramInfo {
    /// Program kind
    #[serde(rename = "type")]
    pub program_type: ProgramType,
    /// Program name
    pub name: String,
}

impl ScheduleProgramInfo {
    /// Create new program reference
    #[inline]
    #[must_use]
    pub fn new(program_type: ProgramType, name: impl Into<String>) -> Self {
        Self {
            program_type,
            name: name.into(),
        }
    }
}

/// Node in a workflow graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum WorkflowNode {
    /// Runs one program
    Action {
        /// Node identifier
        id: String,
        /// Program to run
        program: ScheduleProgramInfo,
    },
    /// Runs every branch concurrently
    Fork {
        /// Optional identifier; anonymous forks take no part in uniqueness
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Branches, each an ordered node sequence
        #[serde(default)]
        branches: Vec<Vec<WorkflowNode>>,
    },
    /// Runs one of two branches depending on a predicate
    Condition {
        /// Node identifier
        id: String,
        /// Predicate class or expression
        #[serde(default, skip_serializing_if = "Option::is_none")]
        predicate: Option<String>,
        /// Nodes run when the predicate holds
        #[serde(default)]
        if_branch: Vec<WorkflowNode>,
        /// Nodes run otherwise
        #[serde(default)]
        else_branch: Vec<WorkflowNode>,
    },
}

impl WorkflowNode {
    /// Action node running a program
    #[must_use]
    pub fn action(id: impl Into<String>, program_type: ProgramType, program: impl Into<String>) -> Self {
        Self::Action {
            id: id.into(),
            program: ScheduleProgramInfo::new(program_type, program),
        }
    }

    /// Anonymous fork
    #[must_use]
    pub fn fork(branches: Vec<Vec<WorkflowNode>>) -> Self {
        Self::Fork { id: None, branches }
    }

    /// Named fork
    #[must_use]
    pub fn named_fork(id: impl Into<String>, branches: Vec<Vec<WorkflowNode>>) -> Self {
        Self::Fork {
            id: Some(id.into()),
            branches,
        }
    }

    /// Condition node without a predicate
    #[must_use]
    pub fn condition(
        id: impl Into<String>,
        if_branch: Vec<WorkflowNode>,
        else_branch: Vec<WorkflowNode>,
    ) -> Self {
        Self::Condition {
            id: id.into(),
            predicate: None,
            if_branch,
            else_branch,
        }
    }

    /// Node identifier, `None` for anonymous forks
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Action { id, .. } | Self::Condition { id, .. } => Some(id.as_str()),
            Self::Fork { id, .. } => id.as_deref(),
        }
    }
}

/// Workflow declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSpecification {
    /// Workflow name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Top level node sequence
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    /// Runtime properties
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl WorkflowSpecification {
    /// Create workflow from its node sequence
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, nodes: Vec<WorkflowNode>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            nodes,
            properties: BTreeMap::new(),
        }
    }
}

impl ProgramLike for WorkflowSpecification {
    fn name(&self) -> &str {
        &self.name
    }

    fn program_type(&self) -> ProgramType {
        ProgramType::Workflow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids() {
        let action = WorkflowNode::action("A", ProgramType::MapReduce, "p1");
        assert_eq!(action.id(), Some("A"));
        assert_eq!(WorkflowNode::fork(vec![]).id(), None);
        assert_eq!(WorkflowNode::named_fork("F", vec![]).id(), Some("F"));
        assert_eq!(WorkflowNode::condition("C", vec![], vec![]).id(), Some("C"));
    }

    #[test]
    fn node_json_shape() {
        let json = r#"{
            "node": "fork",
            "branches": [[{"node": "action", "id": "B", "program": {"type": "spark", "name": "p2"}}]]
        }"#;
        let node: WorkflowNode = serde_json::from_str(json).unwrap();
        match node {
            WorkflowNode::Fork { id, branches } => {
                assert!(id.is_none());
                assert_eq!(branches[0][0].id(), Some("B"));
            }
            other => panic!("unexpected node {other:?}"),
        }
    }
}
