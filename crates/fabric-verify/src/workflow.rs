//! Workflow graph validation
//!
//! Checks a workflow's node tree for:
//! - Identifier uniqueness across the whole graph, nested branches included
//! - Action nodes referencing programs the application declares
//! - Forks with at least one branch
//!
//! A single set of seen identifiers is threaded by `&mut` through the whole
//! depth-first traversal, so a name used in one fork branch cannot be reused
//! in a sibling branch or anywhere else in the workflow.

use crate::error::GraphError;
use fabric_spec::{ApplicationSpecification, ProgramType, ScheduleProgramInfo, WorkflowNode, WorkflowSpecification};
use std::collections::HashSet;

/// Result of a successful validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphReport {
    /// Every node identifier seen during traversal
    pub node_ids: HashSet<String>,
    /// Non-fatal configuration warnings
    pub warnings: Vec<String>,
}

impl GraphReport {
    /// Number of distinct identifiers
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    /// Whether any warning was raised
    #[inline]
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Validator for a single workflow of an application
#[derive(Debug, Clone, Copy)]
pub struct WorkflowGraphValidator<'a> {
    app: &'a ApplicationSpecification,
    workflow: &'a WorkflowSpecification,
}

impl<'a> WorkflowGraphValidator<'a> {
    /// Create validator for `workflow` within `app`
    #[inline]
    #[must_use]
    pub fn new(app: &'a ApplicationSpecification, workflow: &'a WorkflowSpecification) -> Self {
        Self { app, workflow }
    }

    /// Validate the workflow graph
    ///
    /// # Errors
    /// Returns the first [`GraphError`] found in depth-first order
    pub fn validate(&self) -> Result<GraphReport, GraphError> {
        let mut report = GraphReport::default();
        self.validate_nodes(&self.workflow.nodes, &mut report)?;
        Ok(report)
    }

    fn validate_nodes(&self, nodes: &[WorkflowNode], report: &mut GraphReport) -> Result<(), GraphError> {
        for node in nodes {
            if let Some(id) = node.id() {
                if !report.node_ids.insert(id.to_string()) {
                    return Err(GraphError::DuplicateNode {
                        node: id.to_string(),
                        workflow: self.workflow.name.clone(),
                    });
                }
            }
            self.validate_node(node, report)?;
        }
        Ok(())
    }

    fn validate_node(&self, node: &WorkflowNode, report: &mut GraphReport) -> Result<(), GraphError> {
        if node.id() == Some(self.workflow.name.as_str()) {
            let msg = format!(
                "node used in workflow has the same name as the workflow '{}'; \
                 token lookups for this node will be ambiguous",
                self.workflow.name
            );
            tracing::warn!(workflow = %self.workflow.name, "{msg}");
            report.warnings.push(msg);
        }

        match node {
            WorkflowNode::Action { program, .. } => self.validate_action(program),
            WorkflowNode::Fork { branches, .. } => {
                if branches.is_empty() {
                    return Err(GraphError::EmptyFork {
                        workflow: self.workflow.name.clone(),
                    });
                }
                for branch in branches {
                    self.validate_nodes(branch, report)?;
                }
                Ok(())
            }
            WorkflowNode::Condition {
                if_branch,
                else_branch,
                ..
            } => {
                self.validate_nodes(if_branch, report)?;
                self.validate_nodes(else_branch, report)
            }
        }
    }

    fn validate_action(&self, program: &ScheduleProgramInfo) -> Result<(), GraphError> {
        match program.program_type {
            ProgramType::MapReduce | ProgramType::Spark => {
                if self.app.has_program(program.program_type, &program.name) {
                    Ok(())
                } else {
                    Err(GraphError::MissingProgram {
                        kind: program.program_type,
                        program: program.name.clone(),
                    })
                }
            }
            ProgramType::CustomAction => Ok(()),
            other => Err(GraphError::UnknownProgram {
                kind: other,
                program: program.name.clone(),
                workflow: self.workflow.name.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_spec::ProgramSpecification;

    fn app() -> ApplicationSpecification {
        ApplicationSpecification::new("app")
            .with_program(ProgramSpecification::mapreduce("p1"))
            .with_program(ProgramSpecification::spark("s1"))
    }

    fn action(id: &str, program: &str) -> WorkflowNode {
        WorkflowNode::action(id, ProgramType::MapReduce, program)
    }

    #[test]
    fn empty_workflow_is_valid() {
        let app = app();
        let wf = WorkflowSpecification::new("wf", vec![]);
        let report = WorkflowGraphValidator::new(&app, &wf).validate().unwrap();
        assert_eq!(report.node_count(), 0);
        assert!(!report.has_warnings());
    }

    #[test]
    fn empty_condition_branches_are_valid() {
        let app = app();
        let wf = WorkflowSpecification::new("wf", vec![WorkflowNode::condition("c", vec![], vec![])]);
        assert!(WorkflowGraphValidator::new(&app, &wf).validate().is_ok());
    }

    #[test]
    fn duplicate_across_condition_branches() {
        let app = app();
        let wf = WorkflowSpecification::new(
            "wf",
            vec![WorkflowNode::condition("c", vec![action("x", "p1")], vec![action("x", "p1")])],
        );
        let err = WorkflowGraphValidator::new(&app, &wf).validate().unwrap_err();
        assert_eq!(
            err,
            GraphError::DuplicateNode {
                node: "x".into(),
                workflow: "wf".into()
            }
        );
    }

    #[test]
    fn duplicate_between_nested_and_top_level() {
        let app = app();
        let wf = WorkflowSpecification::new(
            "wf",
            vec![WorkflowNode::fork(vec![vec![action("a", "p1")]]), action("a", "p1")],
        );
        assert!(matches!(
            WorkflowGraphValidator::new(&app, &wf).validate(),
            Err(GraphError::DuplicateNode { .. })
        ));
    }

    #[test]
    fn empty_fork_rejected() {
        let app = app();
        let wf = WorkflowSpecification::new("wf", vec![WorkflowNode::fork(vec![])]);
        assert_eq!(
            WorkflowGraphValidator::new(&app, &wf).validate(),
            Err(GraphError::EmptyFork { workflow: "wf".into() })
        );
    }

    #[test]
    fn spark_action_checks_spark_map() {
        let app = app();
        let ok = WorkflowSpecification::new("wf", vec![WorkflowNode::action("s", ProgramType::Spark, "s1")]);
        assert!(WorkflowGraphValidator::new(&app, &ok).validate().is_ok());

        // p1 is a MapReduce program, not a Spark one
        let wrong_kind =
            WorkflowSpecification::new("wf", vec![WorkflowNode::action("s", ProgramType::Spark, "p1")]);
        assert!(matches!(
            WorkflowGraphValidator::new(&app, &wrong_kind).validate(),
            Err(GraphError::MissingProgram { kind: ProgramType::Spark, .. })
        ));
    }

    #[test]
    fn non_runnable_kind_is_unknown() {
        let app = app();
        let wf = WorkflowSpecification::new("wf", vec![WorkflowNode::action("w", ProgramType::Workflow, "other")]);
        assert!(matches!(
            WorkflowGraphValidator::new(&app, &wf).validate(),
            Err(GraphError::UnknownProgram { kind: ProgramType::Workflow, .. })
        ));
    }

    #[test]
    fn node_named_after_workflow_warns() {
        let app = app();
        let wf = WorkflowSpecification::new("wf", vec![action("wf", "p1")]);
        let report = WorkflowGraphValidator::new(&app, &wf).validate().unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.node_ids.contains("wf"));
    }

    #[test]
    fn named_forks_take_part_in_uniqueness() {
        let app = app();
        let wf = WorkflowSpecification::new(
            "wf",
            vec![action("f", "p1"), WorkflowNode::named_fork("f", vec![vec![]])],
        );
        assert!(matches!(
            WorkflowGraphValidator::new(&app, &wf).validate(),
            Err(GraphError::DuplicateNode { .. })
        ));
    }
}
