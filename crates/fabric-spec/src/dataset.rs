//! Dataset declarations and the registry's view of existing datasets

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dataset an application asks to be created on deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetCreationSpec {
    /// Instance name, unique per namespace
    pub instance_name: String,
    /// Dataset type name
    pub type_name: String,
    /// Creation properties
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl DatasetCreationSpec {
    /// Create new creation spec
    #[inline]
    #[must_use]
    pub fn new(instance_name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            instance_name: instance_name.into(),
            type_name: type_name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// With a property
    #[inline]
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Dataset as recorded by the dataset registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSpecification {
    /// Instance name
    pub name: String,
    /// Dataset type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Instance properties
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl DatasetSpecification {
    /// Create new specification
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            properties: BTreeMap::new(),
        }
    }
}

impl From<&DatasetCreationSpec> for DatasetSpecification {
    fn from(spec: &DatasetCreationSpec) -> Self {
        Self {
            name: spec.instance_name.clone(),
            type_name: spec.type_name.clone(),
            properties: spec.properties.clone(),
        }
    }
}
