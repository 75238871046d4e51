//! Error types for the verification stage
//!
//! Every gate of the stage fails with a [`VerificationError`]; the
//! structural workflow failures and ownership conflicts keep their own
//! types ([`GraphError`], [`AuthorizationError`]) so callers can tell them
//! apart.

use fabric_spec::{EntityId, IdError, ProgramType};

/// Workflow graph violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Identifier already used somewhere in the same workflow
    #[error("node '{node}' already exists in workflow '{workflow}'")]
    DuplicateNode { node: String, workflow: String },

    /// Action references a MapReduce/Spark program the application lacks
    #[error("{kind} program '{program}' is not configured with the application")]
    MissingProgram { kind: ProgramType, program: String },

    /// Action references a program kind workflows cannot run
    #[error("unknown program '{program}' of type {kind} in workflow '{workflow}'")]
    UnknownProgram {
        kind: ProgramType,
        program: String,
        workflow: String,
    },

    /// Fork declared without branches
    #[error("fork is added in workflow '{workflow}' without any branches")]
    EmptyFork { workflow: String },
}

/// Requested owner differs from the owner of record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "updating the owner of {} is not supported: existing owner {}, requested owner {}",
    .entity,
    .existing.as_deref().unwrap_or("<none>"),
    .requested.as_deref().unwrap_or("<none>")
)]
pub struct AuthorizationError {
    /// Entity whose owner was compared
    pub entity: EntityId,
    /// Owner of record
    pub existing: Option<String>,
    /// Owner requested by the deployment
    pub requested: Option<String>,
}

/// Failures reported by the metadata store, dataset registry or owner admin
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend could not serve the request
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Principal may not access the entity
    #[error("principal '{principal}' is not authorized for {entity}")]
    Unauthorized { principal: String, entity: EntityId },

    /// Entity already present
    #[error("{0} already exists")]
    AlreadyExists(EntityId),
}

/// Any failed gate of the verification stage
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// Owner principal does not parse
    #[error("invalid owner principal: {0}")]
    InvalidPrincipal(#[from] IdError),

    /// Owner principal conflicts with existing state
    #[error(transparent)]
    Unauthorized(#[from] AuthorizationError),

    /// A verifier rejected part of the specification
    #[error("{0}")]
    InvalidSpecification(String),

    /// Dataset exists with another type
    #[error("cannot deploy dataset '{dataset}' with type '{type_name}': dataset with different type already exists")]
    DatasetTypeMismatch { dataset: String, type_name: String },

    /// Workflow graph violation
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Schedule targets a workflow the application lacks
    #[error("schedule '{schedule}' is invalid: workflow '{workflow}' is not configured in application '{application}'")]
    InvalidSchedule {
        schedule: String,
        workflow: String,
        application: String,
    },

    /// Collaborator failure while checking existing state
    #[error("verification backend error: {0}")]
    Backend(#[from] StoreError),
}

impl VerificationError {
    /// Whether the failure is an ownership conflict
    #[inline]
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized(_) | Self::Backend(StoreError::Unauthorized { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_spec::DatasetId;

    #[test]
    fn authorization_error_display() {
        let err = AuthorizationError {
            entity: EntityId::Dataset(DatasetId::new("ns", "events")),
            existing: Some("alice@R".to_string()),
            requested: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("dataset:ns.events"));
        assert!(msg.contains("alice@R"));
        assert!(msg.contains("<none>"));
    }

    #[test]
    fn graph_error_names_node_and_workflow() {
        let err = GraphError::DuplicateNode {
            node: "B".to_string(),
            workflow: "W".to_string(),
        };
        assert_eq!(err.to_string(), "node 'B' already exists in workflow 'W'");
    }

    #[test]
    fn unauthorized_classification() {
        let err: VerificationError = AuthorizationError {
            entity: EntityId::Dataset(DatasetId::new("ns", "d")),
            existing: None,
            requested: Some("bob".to_string()),
        }
        .into();
        assert!(err.is_unauthorized());
        assert!(!VerificationError::InvalidSpecification("x".into()).is_unauthorized());
    }
}
