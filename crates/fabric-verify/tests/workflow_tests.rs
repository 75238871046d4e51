//! Workflow graph validation scenarios

use fabric_spec::{ApplicationSpecification, ProgramType, WorkflowNode, WorkflowSpecification};
use fabric_test_utils::{app_with_programs, mr, workflow_w, workflow_w_duplicate};
use fabric_verify::{GraphError, WorkflowGraphValidator};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;

#[test]
fn scenario_w_records_every_identifier() {
    let app = app_with_programs("app");
    let wf = workflow_w();

    let report = WorkflowGraphValidator::new(&app, &wf).validate().unwrap();

    let expected: HashSet<String> = ["A", "B", "C", "D", "E"].iter().map(|s| (*s).to_string()).collect();
    assert_eq!(report.node_ids, expected);
    assert!(report.warnings.is_empty());
}

#[test]
fn scenario_w_duplicate_across_fork_branches() {
    let app = app_with_programs("app");
    let wf = workflow_w_duplicate();

    let err = WorkflowGraphValidator::new(&app, &wf).validate().unwrap_err();
    assert_eq!(
        err,
        GraphError::DuplicateNode {
            node: "B".to_string(),
            workflow: "W".to_string(),
        }
    );
    assert!(err.to_string().contains("'B'"));
}

#[test]
fn missing_mapreduce_program_rejected() {
    let app = app_with_programs("app");
    let wf = WorkflowSpecification::new("W", vec![mr("A", "nope")]);

    assert_eq!(
        WorkflowGraphValidator::new(&app, &wf).validate(),
        Err(GraphError::MissingProgram {
            kind: ProgramType::MapReduce,
            program: "nope".to_string(),
        })
    );
}

#[test]
fn custom_action_always_accepted() {
    let app = ApplicationSpecification::new("app");
    let wf = WorkflowSpecification::new(
        "W",
        vec![WorkflowNode::action("notify", ProgramType::CustomAction, "anything")],
    );
    assert!(WorkflowGraphValidator::new(&app, &wf).validate().is_ok());
}

#[test]
fn empty_fork_rejected() {
    let app = app_with_programs("app");
    let wf = WorkflowSpecification::new("W", vec![mr("A", "p1"), WorkflowNode::fork(vec![])]);
    assert_eq!(
        WorkflowGraphValidator::new(&app, &wf).validate(),
        Err(GraphError::EmptyFork {
            workflow: "W".to_string()
        })
    );
}

#[test]
fn node_named_like_workflow_is_a_warning() {
    let app = app_with_programs("app");
    let wf = WorkflowSpecification::new("W", vec![mr("W", "p1"), mr("X", "p2")]);

    let report = WorkflowGraphValidator::new(&app, &wf).validate().unwrap();
    assert_eq!(report.node_count(), 2);
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn empty_branches_are_legal() {
    let app = app_with_programs("app");
    let wf = WorkflowSpecification::new(
        "W",
        vec![
            WorkflowNode::fork(vec![vec![], vec![]]),
            WorkflowNode::condition("D", vec![], vec![]),
        ],
    );
    let report = WorkflowGraphValidator::new(&app, &wf).validate().unwrap();
    assert_eq!(report.node_count(), 1);
}

/// Shape of a generated node tree, before identifiers are assigned
#[derive(Debug, Clone)]
enum Shape {
    Action,
    Fork(Vec<Vec<Shape>>),
    Condition(Vec<Shape>, Vec<Shape>),
}

fn shape_strategy() -> impl Strategy<Value = Vec<Shape>> {
    let leaf = Just(Shape::Action);
    let node = leaf.prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(prop::collection::vec(inner.clone(), 0..3), 1..3).prop_map(Shape::Fork),
            (prop::collection::vec(inner.clone(), 0..3), prop::collection::vec(inner, 0..3))
                .prop_map(|(a, b)| Shape::Condition(a, b)),
        ]
    });
    prop::collection::vec(node, 0..5)
}

fn build(shapes: &[Shape], next: &mut usize) -> Vec<WorkflowNode> {
    shapes
        .iter()
        .map(|shape| {
            *next += 1;
            let id = format!("n{next}");
            match shape {
                Shape::Action => mr(&id, "p1"),
                Shape::Fork(branches) => WorkflowNode::fork(branches.iter().map(|b| build(b, next)).collect()),
                Shape::Condition(a, b) => {
                    let if_branch = build(a, next);
                    let else_branch = build(b, next);
                    WorkflowNode::condition(id, if_branch, else_branch)
                }
            }
        })
        .collect()
}

fn count_ids(nodes: &[WorkflowNode]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            WorkflowNode::Action { .. } => 1,
            WorkflowNode::Fork { branches, .. } => branches.iter().map(|b| count_ids(b)).sum(),
            WorkflowNode::Condition {
                if_branch, else_branch, ..
            } => 1 + count_ids(if_branch) + count_ids(else_branch),
        })
        .sum()
}

fn first_action_id(nodes: &[WorkflowNode]) -> Option<String> {
    for node in nodes {
        match node {
            WorkflowNode::Action { id, .. } => return Some(id.clone()),
            WorkflowNode::Fork { branches, .. } => {
                if let Some(id) = branches.iter().find_map(|b| first_action_id(b)) {
                    return Some(id);
                }
            }
            WorkflowNode::Condition {
                if_branch, else_branch, ..
            } => {
                if let Some(id) = first_action_id(if_branch).or_else(|| first_action_id(else_branch)) {
                    return Some(id);
                }
            }
        }
    }
    None
}

proptest! {
    #[test]
    fn unique_ids_accepted_at_any_depth(shapes in shape_strategy()) {
        let app = app_with_programs("app");
        let mut next = 0;
        let nodes = build(&shapes, &mut next);
        let expected = count_ids(&nodes);
        let wf = WorkflowSpecification::new("W", nodes);

        let report = WorkflowGraphValidator::new(&app, &wf).validate().unwrap();
        prop_assert_eq!(report.node_count(), expected);
    }

    #[test]
    fn reused_id_rejected_at_any_depth(shapes in shape_strategy()) {
        let app = app_with_programs("app");
        let mut next = 0;
        let mut nodes = build(&shapes, &mut next);
        if let Some(id) = first_action_id(&nodes) {
            nodes.push(mr(&id, "p1"));
            let wf = WorkflowSpecification::new("W", nodes);
            let rejected = matches!(
                WorkflowGraphValidator::new(&app, &wf).validate(),
                Err(GraphError::DuplicateNode { node, .. }) if node == id
            );
            prop_assert!(rejected);
        }
    }
}
