//! Application specification
//!
//! The packaged description of everything an archive deploys: programs by
//! kind, datasets to create and schedules over workflows. Produced once by
//! the archive reader and only read afterwards.

use crate::dataset::DatasetCreationSpec;
use crate::id::DEFAULT_VERSION;
use crate::program::{ProgramLike, ProgramSpecification, ProgramType};
use crate::workflow::WorkflowSpecification;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schedule attached to a workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleCreationSpec {
    /// Schedule name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Name of the workflow this schedule triggers
    pub program_name: String,
    /// Trigger properties
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ScheduleCreationSpec {
    /// Create new schedule targeting a workflow
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, program_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            program_name: program_name.into(),
            properties: BTreeMap::new(),
        }
    }
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

/// Application specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSpecification {
    /// Application name
    pub name: String,
    /// Application version
    #[serde(default = "default_version")]
    pub version: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// MapReduce programs by name
    #[serde(default)]
    pub mapreduce: BTreeMap<String, ProgramSpecification>,
    /// Spark programs by name
    #[serde(default)]
    pub spark: BTreeMap<String, ProgramSpecification>,
    /// Workflows by name
    #[serde(default)]
    pub workflows: BTreeMap<String, WorkflowSpecification>,
    /// Datasets to create, by instance name
    #[serde(default)]
    pub datasets: BTreeMap<String, DatasetCreationSpec>,
    /// Schedules by name
    #[serde(default)]
    pub schedules: BTreeMap<String, ScheduleCreationSpec>,
}

impl ApplicationSpecification {
    /// Create an empty application
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            description: String::new(),
            mapreduce: BTreeMap::new(),
            spark: BTreeMap::new(),
            workflows: BTreeMap::new(),
            datasets: BTreeMap::new(),
            schedules: BTreeMap::new(),
        }
    }

    /// With version
    #[inline]
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Add a MapReduce or Spark program, keyed by its name
    ///
    /// Programs of any other kind are ignored; workflows go through
    /// [`Self::with_workflow`].
    #[must_use]
    pub fn with_program(mut self, program: ProgramSpecification) -> Self {
        match program.program_type {
            ProgramType::MapReduce => {
                self.mapreduce.insert(program.name.clone(), program);
            }
            ProgramType::Spark => {
                self.spark.insert(program.name.clone(), program);
            }
            _ => {}
        }
        self
    }

    /// Add a workflow, keyed by its name
    #[inline]
    #[must_use]
    pub fn with_workflow(mut self, workflow: WorkflowSpecification) -> Self {
        self.workflows.insert(workflow.name.clone(), workflow);
        self
    }

    /// Add a dataset, keyed by its instance name
    #[inline]
    #[must_use]
    pub fn with_dataset(mut self, dataset: DatasetCreationSpec) -> Self {
        self.datasets.insert(dataset.instance_name.clone(), dataset);
        self
    }

    /// Add a schedule, keyed by its name
    #[inline]
    #[must_use]
    pub fn with_schedule(mut self, schedule: ScheduleCreationSpec) -> Self {
        self.schedules.insert(schedule.name.clone(), schedule);
        self
    }

    /// Whether a program of the given kind is declared
    #[must_use]
    pub fn has_program(&self, program_type: ProgramType, name: &str) -> bool {
        match program_type {
            ProgramType::MapReduce => self.mapreduce.contains_key(name),
            ProgramType::Spark => self.spark.contains_key(name),
            ProgramType::Workflow => self.workflows.contains_key(name),
            _ => false,
        }
    }

    /// All MapReduce, Spark and workflow programs with their map keys
    pub fn programs(&self) -> impl Iterator<Item = (&str, &dyn ProgramLike)> {
        let mapreduce = self
            .mapreduce
            .iter()
            .map(|(k, p)| (k.as_str(), p as &dyn ProgramLike));
        let spark = self
            .spark
            .iter()
            .map(|(k, p)| (k.as_str(), p as &dyn ProgramLike));
        let workflows = self
            .workflows
            .iter()
            .map(|(k, w)| (k.as_str(), w as &dyn ProgramLike));
        mapreduce.chain(spark).chain(workflows)
    }

    /// Names of every declared program
    #[must_use]
    pub fn program_names(&self) -> Vec<String> {
        self.programs().map(|(_, p)| p.name().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keys_by_name() {
        let app = ApplicationSpecification::new("purchases")
            .with_program(ProgramSpecification::mapreduce("p1"))
            .with_program(ProgramSpecification::spark("s1"))
            .with_program(ProgramSpecification::new("svc", ProgramType::Service))
            .with_workflow(WorkflowSpecification::new("wf", vec![]))
            .with_dataset(DatasetCreationSpec::new("events", "table"))
            .with_schedule(ScheduleCreationSpec::new("nightly", "wf"));

        assert!(app.has_program(ProgramType::MapReduce, "p1"));
        assert!(app.has_program(ProgramType::Spark, "s1"));
        assert!(app.has_program(ProgramType::Workflow, "wf"));
        assert!(!app.has_program(ProgramType::Service, "svc"));
        assert_eq!(app.programs().count(), 3);
        assert_eq!(app.version, DEFAULT_VERSION);
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let app: ApplicationSpecification = serde_json::from_str(r#"{"name": "empty"}"#).unwrap();
        assert_eq!(app, ApplicationSpecification::new("empty"));
    }
}
