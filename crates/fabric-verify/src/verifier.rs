//! Specification verifiers
//!
//! One stateless verifier per specification category. Dispatch is a closed
//! `match` over [`SpecKind`]; there is no open-ended lookup by type.

use crate::error::VerificationError;
use fabric_spec::{
    is_valid_dataset_id, is_valid_id, ApplicationId, ApplicationSpecification,
    DatasetCreationSpec, ProgramLike, ProgramType,
};
use std::fmt;

/// Outcome of a single verifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResult {
    success: bool,
    message: Option<String>,
}

impl VerifyResult {
    /// Passing result
    #[inline]
    #[must_use]
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Failing result with a human-readable reason
    #[inline]
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    /// Whether verification passed
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Failure reason
    #[inline]
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Convert into the stage's error type
    ///
    /// # Errors
    /// Returns [`VerificationError::InvalidSpecification`] carrying the
    /// failure message
    pub fn into_result(self) -> Result<(), VerificationError> {
        if self.success {
            Ok(())
        } else {
            Err(VerificationError::InvalidSpecification(
                self.message.unwrap_or_else(|| "verification failed".to_string()),
            ))
        }
    }
}

/// Registry cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecKind {
    /// Application specification
    Application,
    /// Dataset creation spec
    DatasetCreation,
    /// Program specification of one kind
    Program(ProgramType),
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Application => f.write_str("application"),
            Self::DatasetCreation => f.write_str("dataset-creation"),
            Self::Program(t) => write!(f, "program:{t}"),
        }
    }
}

/// Borrowed specification handed to a verifier
#[derive(Clone, Copy)]
pub enum SpecRef<'a> {
    /// Application specification
    Application(&'a ApplicationSpecification),
    /// Dataset creation spec
    DatasetCreation(&'a DatasetCreationSpec),
    /// Program specification
    Program(&'a dyn ProgramLike),
}

impl SpecRef<'_> {
    /// Cache key for this specification
    #[must_use]
    pub fn kind(&self) -> SpecKind {
        match self {
            Self::Application(_) => SpecKind::Application,
            Self::DatasetCreation(_) => SpecKind::DatasetCreation,
            Self::Program(p) => SpecKind::Program(p.program_type()),
        }
    }
}

impl fmt::Debug for SpecRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Application(a) => f.debug_tuple("Application").field(&a.name).finish(),
            Self::DatasetCreation(d) => f.debug_tuple("DatasetCreation").field(&d.instance_name).finish(),
            Self::Program(p) => f.debug_tuple("Program").field(&p.name()).finish(),
        }
    }
}

/// Checks application-level well-formedness
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationVerifier;

impl ApplicationVerifier {
    /// Verify name and program map keys
    #[must_use]
    pub fn verify(&self, _app_id: &ApplicationId, spec: &ApplicationSpecification) -> VerifyResult {
        if spec.name.is_empty() {
            return VerifyResult::failure("application name is empty");
        }
        if !is_valid_id(&spec.name) {
            return VerifyResult::failure(format!(
                "application name '{}' must contain only letters, digits, '_' or '-'",
                spec.name
            ));
        }
        if spec.version.is_empty() {
            return VerifyResult::failure(format!("application '{}' has an empty version", spec.name));
        }
        for (key, program) in spec.programs() {
            if key != program.name() {
                return VerifyResult::failure(format!(
                    "{} program registered as '{key}' is named '{}'",
                    program.program_type(),
                    program.name()
                ));
            }
        }
        for (key, dataset) in &spec.datasets {
            if key != &dataset.instance_name {
                return VerifyResult::failure(format!(
                    "dataset registered as '{key}' is named '{}'",
                    dataset.instance_name
                ));
            }
        }
        VerifyResult::success()
    }
}

/// Checks dataset creation requests
#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetCreationSpecVerifier;

impl DatasetCreationSpecVerifier {
    /// Verify instance and type names
    #[must_use]
    pub fn verify(&self, app_id: &ApplicationId, spec: &DatasetCreationSpec) -> VerifyResult {
        if !is_valid_dataset_id(&spec.instance_name) {
            return VerifyResult::failure(format!(
                "dataset instance name '{}' in application '{}' is invalid",
                spec.instance_name, app_id.application
            ));
        }
        if spec.type_name.trim().is_empty() {
            return VerifyResult::failure(format!(
                "dataset '{}' does not declare a type",
                spec.instance_name
            ));
        }
        VerifyResult::success()
    }
}

/// Checks one program declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramVerifier {
    program_type: ProgramType,
}

impl ProgramVerifier {
    /// Verifier for programs of one kind
    #[inline]
    #[must_use]
    pub fn new(program_type: ProgramType) -> Self {
        Self { program_type }
    }

    /// Kind this verifier was built for
    #[inline]
    #[must_use]
    pub fn program_type(&self) -> ProgramType {
        self.program_type
    }

    /// Verify the program name
    #[must_use]
    pub fn verify(&self, app_id: &ApplicationId, program: &dyn ProgramLike) -> VerifyResult {
        if program.program_type() != self.program_type {
            return VerifyResult::failure(format!(
                "{} verifier cannot check {} program '{}'",
                self.program_type,
                program.program_type(),
                program.name()
            ));
        }
        if !is_valid_id(program.name()) {
            return VerifyResult::failure(format!(
                "{} program name '{}' in application '{}' is invalid",
                self.program_type,
                program.name(),
                app_id.application
            ));
        }
        VerifyResult::success()
    }
}

/// Verifier for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecVerifier {
    /// Application verifier
    Application,
    /// Dataset creation verifier
    DatasetCreation,
    /// Program verifier
    Program(ProgramVerifier),
}

impl SpecVerifier {
    /// Build the verifier for a kind
    #[must_use]
    pub fn for_kind(kind: SpecKind) -> Self {
        match kind {
            SpecKind::Application => Self::Application,
            SpecKind::DatasetCreation => Self::DatasetCreation,
            SpecKind::Program(t) => Self::Program(ProgramVerifier::new(t)),
        }
    }

    /// Verify a specification
    ///
    /// A specification from another category fails rather than panicking.
    #[must_use]
    pub fn verify(&self, app_id: &ApplicationId, spec: SpecRef<'_>) -> VerifyResult {
        match (self, spec) {
            (Self::Application, SpecRef::Application(a)) => ApplicationVerifier.verify(app_id, a),
            (Self::DatasetCreation, SpecRef::DatasetCreation(d)) => {
                DatasetCreationSpecVerifier.verify(app_id, d)
            }
            (Self::Program(v), SpecRef::Program(p)) => v.verify(app_id, p),
            (_, other) => VerifyResult::failure(format!(
                "no verifier of this category for {}",
                other.kind()
            )),
        }
    }
}
