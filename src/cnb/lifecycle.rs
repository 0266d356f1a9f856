//! `bin/detect` and `bin/build` entry points.

use super::context::{BuildContext, BuildpackInfo, DetectContext, DetectOutcome, Platform};
use super::layer::{LayerError, Layers};
use super::plan::BuildpackPlan;
use super::{Builder, Detector};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Detection passed.
pub const EXIT_PASS: i32 = 0;
/// Detection declined; the lifecycle skips this buildpack.
pub const EXIT_FAIL: i32 = 100;
pub const EXIT_ERROR: i32 = 1;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },

    #[error(transparent)]
    Layer(#[from] LayerError),

    #[error(transparent)]
    Buildpack(anyhow::Error),
}

/// Arguments and environment of a `bin/detect` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectInvocation {
    pub working_dir: PathBuf,
    pub cnb_path: PathBuf,
    pub platform_dir: PathBuf,
    pub plan_path: PathBuf,
}

/// Arguments and environment of a `bin/build` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInvocation {
    pub working_dir: PathBuf,
    pub cnb_path: PathBuf,
    pub layers_dir: PathBuf,
    pub platform_dir: PathBuf,
    pub plan_path: PathBuf,
    pub stack: String,
}

#[derive(Deserialize)]
struct BuildpackDescriptor {
    buildpack: BuildpackInfo,
}

/// Reads the `[buildpack]` table from `<cnb_path>/buildpack.toml`.
pub fn read_buildpack_info(cnb_path: &Path) -> Result<BuildpackInfo, LifecycleError> {
    let descriptor: BuildpackDescriptor = read_toml(&cnb_path.join("buildpack.toml"))?;
    Ok(descriptor.buildpack)
}

/// Runs detection and writes the build plan on a pass. Returns the exit code
/// for the lifecycle: [`EXIT_PASS`] or [`EXIT_FAIL`].
pub fn run_detect<D: Detector>(
    detector: &D,
    invocation: &DetectInvocation,
) -> Result<i32, LifecycleError> {
    let buildpack_info = read_buildpack_info(&invocation.cnb_path)?;
    info!(
        buildpack = %buildpack_info.id,
        version = %buildpack_info.version,
        "Running detection"
    );

    let context = DetectContext {
        working_dir: invocation.working_dir.clone(),
        cnb_path: invocation.cnb_path.clone(),
        buildpack_info,
        platform: Platform {
            path: invocation.platform_dir.clone(),
        },
    };

    let outcome = detector
        .detect(&context)
        .map_err(|e| LifecycleError::Buildpack(anyhow::Error::new(e)))?;

    match outcome {
        DetectOutcome::Fail => {
            info!("Buildpack does not apply to this application");
            Ok(EXIT_FAIL)
        }
        DetectOutcome::Pass(plan) => {
            write_toml(&invocation.plan_path, &plan)?;
            debug!(plan = %invocation.plan_path.display(), "Wrote build plan");
            Ok(EXIT_PASS)
        }
    }
}

/// Runs the build and writes layer metadata, env files, `launch.toml` and
/// `build.toml`.
pub fn run_build<B: Builder>(
    builder: &B,
    invocation: &BuildInvocation,
) -> Result<(), LifecycleError> {
    let buildpack_info = read_buildpack_info(&invocation.cnb_path)?;
    let plan: BuildpackPlan = read_toml(&invocation.plan_path)?;

    info!(
        buildpack = %buildpack_info.id,
        version = %buildpack_info.version,
        stack = %invocation.stack,
        "Running build"
    );

    let context = BuildContext {
        buildpack_info,
        cnb_path: invocation.cnb_path.clone(),
        platform: Platform {
            path: invocation.platform_dir.clone(),
        },
        layers: Layers::new(&invocation.layers_dir),
        plan,
        stack: invocation.stack.clone(),
        working_dir: invocation.working_dir.clone(),
    };

    let result = builder
        .build(context)
        .map_err(|e| LifecycleError::Buildpack(anyhow::Error::new(e)))?;

    for layer in &result.layers {
        layer.write(&invocation.layers_dir)?;
        debug!(layer = %layer.name, "Wrote layer metadata");
    }

    if !result.launch.bom.is_empty() {
        write_toml(&invocation.layers_dir.join("launch.toml"), &result.launch)?;
    }
    if !result.build.bom.is_empty() {
        write_toml(&invocation.layers_dir.join("build.toml"), &result.build)?;
    }

    Ok(())
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, LifecycleError> {
    let content = fs::read_to_string(path).map_err(|source| LifecycleError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| LifecycleError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<(), LifecycleError> {
    let content = toml::to_string(value).map_err(|source| LifecycleError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, content).map_err(|source| LifecycleError::Write {
        path: path.to_path_buf(),
        source,
    })
}
