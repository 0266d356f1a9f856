//! Inputs and outputs of the detect and build phases.

use super::layer::{Layer, Layers};
use super::plan::{BuildPlan, BuildpackPlan};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The `[buildpack]` table of `buildpack.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildpackInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Platform {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectContext {
    pub working_dir: PathBuf,
    pub cnb_path: PathBuf,
    pub buildpack_info: BuildpackInfo,
    pub platform: Platform,
}

impl DetectContext {
    /// Context for a bare working directory, as used by tests and tooling.
    pub fn for_dir(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            cnb_path: PathBuf::new(),
            buildpack_info: BuildpackInfo::default(),
            platform: Platform::default(),
        }
    }
}

/// Result of the detect phase. `Fail` means "not applicable", not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectOutcome {
    Pass(BuildPlan),
    Fail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildContext {
    pub buildpack_info: BuildpackInfo,
    pub cnb_path: PathBuf,
    pub platform: Platform,
    pub layers: Layers,
    pub plan: BuildpackPlan,
    pub stack: String,
    pub working_dir: PathBuf,
}

/// Bill of Materials record for one installed dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomEntry {
    pub name: String,
    pub metadata: BomMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomMetadata {
    pub version: String,
    pub uri: String,
    pub sha256: String,
    #[serde(default)]
    pub stacks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<String>,
}

/// Contents of `<layers>/build.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bom: Vec<BomEntry>,
}

/// Contents of `<layers>/launch.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bom: Vec<BomEntry>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildResult {
    pub layers: Vec<Layer>,
    pub build: BuildMetadata,
    pub launch: LaunchMetadata,
}
