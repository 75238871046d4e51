//! Program specifications

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of program an application can declare or a workflow can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramType {
    /// Batch MapReduce job
    MapReduce,
    /// Spark job
    Spark,
    /// Workflow over other programs
    Workflow,
    /// Inline action executed by the workflow driver
    CustomAction,
    /// Long running service
    Service,
    /// Background worker
    Worker,
}

impl ProgramType {
    /// Stable lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MapReduce => "mapreduce",
            Self::Spark => "spark",
            Self::Workflow => "workflow",
            Self::CustomAction => "custom_action",
            Self::Service => "service",
            Self::Worker => "worker",
        }
    }
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that can be checked as a program
pub trait ProgramLike {
    /// Declared program name
    fn name(&self) -> &str;

    /// Program kind
    fn program_type(&self) -> ProgramType;
}

/// MapReduce or Spark program declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSpecification {
    /// Program name
    pub name: String,
    /// Program kind
    #[serde(rename = "type")]
    pub program_type: ProgramType,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Entry point class, if the runtime needs one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
    /// Runtime properties
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ProgramSpecification {
    /// Create a program of the given kind
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, program_type: ProgramType) -> Self {
        Self {
            name: name.into(),
            program_type,
            description: String::new(),
            main_class: None,
            properties: BTreeMap::new(),
        }
    }

    /// Shorthand for a MapReduce program
    #[inline]
    #[must_use]
    pub fn mapreduce(name: impl Into<String>) -> Self {
        Self::new(name, ProgramType::MapReduce)
    }

    /// Shorthand for a Spark program
    #[inline]
    #[must_use]
    pub fn spark(name: impl Into<String>) -> Self {
        Self::new(name, ProgramType::Spark)
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With main class
    #[inline]
    #[must_use]
    pub fn with_main_class(mut self, main_class: impl Into<String>) -> Self {
        self.main_class = Some(main_class.into());
        self
    }
}

impl ProgramLike for ProgramSpecification {
    fn name(&self) -> &str {
        &self.name
    }

    fn program_type(&self) -> ProgramType {
        self.program_type
    }
}
