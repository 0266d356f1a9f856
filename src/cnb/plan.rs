//! Build plan records exchanged with the lifecycle.

use serde::{Deserialize, Serialize};

/// What a buildpack offers and needs, written by `bin/detect`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<BuildPlanProvision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<BuildPlanRequirement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlanProvision {
    pub name: String,
}

impl BuildPlanProvision {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlanRequirement {
    pub name: String,
    #[serde(default)]
    pub metadata: BuildPlanMetadata,
}

/// Requirement metadata. `version` and `version-source` travel together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildPlanMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_source: Option<String>,
    #[serde(default)]
    pub build: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub launch: bool,
}

/// The entries the lifecycle resolved for this buildpack, read by `bin/build`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildpackPlan {
    #[serde(default)]
    pub entries: Vec<BuildpackPlanEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildpackPlanEntry {
    pub name: String,
    #[serde(default)]
    pub metadata: toml::Table,
}

impl BuildpackPlanEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: toml::Table::new(),
        }
    }

    pub fn with_flag(mut self, key: &str, value: bool) -> Self {
        self.metadata.insert(key.to_string(), toml::Value::Boolean(value));
        self
    }

    /// True when `metadata.<key>` is the boolean `true`.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.metadata.get(key), Some(toml::Value::Boolean(true)))
    }
}
