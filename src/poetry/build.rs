use super::install::{InstallError, InstallProcess};
use super::site::{SitePackageProcess, SitePackagesError};
use super::{BUILDPACK_TOML, POETRY, PYTHONPATH};
use crate::cnb::{BuildContext, BuildResult, Builder, EntryResolver, LayerError};
use crate::postal::{DependencyError, DependencyManager};
use chrono::Utc;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

const STAGING_PREFIX: &str = "poetry-source";

/// Failures of the build phase, one variant per step.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to resolve poetry dependency: {0}")]
    Resolve(#[source] DependencyError),

    #[error("failed to get {name} layer: {source}")]
    Layer {
        name: String,
        #[source]
        source: LayerError,
    },

    #[error("failed to create temp poetry-source dir: {0}")]
    StagingDir(#[source] io::Error),

    #[error("failed to deliver poetry dependency: {0}")]
    Deliver(#[source] DependencyError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error("failed to locate site packages in poetry layer: {0}")]
    SitePackages(#[from] SitePackagesError),

    #[error("poetry installation failed: site packages are missing from {}", .layer.display())]
    MissingSitePackages { layer: PathBuf },
}

pub struct PoetryBuilder<D, E, I, S> {
    dependencies: D,
    entries: E,
    install: I,
    site: S,
}

impl<D, E, I, S> PoetryBuilder<D, E, I, S>
where
    D: DependencyManager,
    E: EntryResolver,
    I: InstallProcess,
    S: SitePackageProcess,
{
    pub fn new(dependencies: D, entries: E, install: I, site: S) -> Self {
        Self {
            dependencies,
            entries,
            install,
            site,
        }
    }
}

impl<D, E, I, S> Builder for PoetryBuilder<D, E, I, S>
where
    D: DependencyManager,
    E: EntryResolver,
    I: InstallProcess,
    S: SitePackageProcess,
{
    type Error = BuildError;

    fn build(&self, context: BuildContext) -> Result<BuildResult, BuildError> {
        info!(
            buildpack = %context.buildpack_info.name,
            version = %context.buildpack_info.version,
            "Building"
        );

        let dependency = self
            .dependencies
            .resolve(
                &context.cnb_path.join(BUILDPACK_TOML),
                POETRY,
                "*",
                &context.stack,
            )
            .map_err(BuildError::Resolve)?;
        info!(version = %dependency.version, stack = %context.stack, "Selected Poetry");

        if let Some(date) = dependency.deprecation_date() {
            if dependency.is_deprecated(Utc::now()) {
                warn!(
                    version = %dependency.version,
                    deprecated_since = %date.format("%Y-%m-%d"),
                    "Poetry version is deprecated, upgrade the buildpack"
                );
            }
        }

        let bom = self
            .dependencies
            .generate_bill_of_materials(std::slice::from_ref(&dependency));

        let mut layer = context
            .layers
            .get(POETRY)
            .map_err(|source| BuildError::Layer {
                name: POETRY.to_string(),
                source,
            })?;

        let (launch, build) = self
            .entries
            .merge_layer_types(POETRY, &context.plan.entries);
        layer.launch = launch;
        layer.build = build;
        layer.cache = build;
        debug!(launch, build, cache = build, "Layer flags");

        // Removed when dropped, on every return path below.
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir()
            .map_err(BuildError::StagingDir)?;

        info!(uri = %dependency.uri, "Installing Poetry {}", dependency.version);
        self.dependencies
            .deliver(
                &dependency,
                &context.cnb_path,
                staging.path(),
                &context.platform.path,
            )
            .map_err(BuildError::Deliver)?;

        self.install.execute(staging.path(), &layer.path)?;

        let output = self.site.execute(&layer.path)?;
        let site_packages = output.trim_end_matches('\n');
        if site_packages.is_empty() {
            return Err(BuildError::MissingSitePackages {
                layer: layer.path.clone(),
            });
        }

        info!(path = %site_packages, "Prepending site-packages to {}", PYTHONPATH);
        layer.shared_env.prepend(PYTHONPATH, site_packages, ":");

        let mut result = BuildResult::default();
        if layer.build {
            result.build.bom = bom.clone();
        }
        if layer.launch {
            result.launch.bom = bom;
        }
        result.layers.push(layer);

        Ok(result)
    }
}
