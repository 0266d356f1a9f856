use super::archive::{extract, file_name_from_uri};
use super::dependency::{parse_constraint, parse_version, BuildpackToml, Dependency};
use super::mappings::DependencyMappingResolver;
use super::transport::{HttpTransport, Transport};
use super::DependencyError;
use crate::cnb::{BomEntry, BomMetadata};
use crate::fs::{FileSystem, RealFileSystem};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info};

/// Picks, fetches and describes buildpack dependencies.
#[cfg_attr(test, mockall::automock)]
pub trait DependencyManager {
    /// Best match for `id` and `version` on `stack` among the dependencies in
    /// the buildpack.toml at `path`.
    fn resolve(
        &self,
        path: &Path,
        id: &str,
        version: &str,
        stack: &str,
    ) -> Result<Dependency, DependencyError>;

    /// Downloads, verifies and unpacks `dependency` into `destination`.
    fn deliver(
        &self,
        dependency: &Dependency,
        cnb_path: &Path,
        destination: &Path,
        platform_path: &Path,
    ) -> Result<(), DependencyError>;

    fn generate_bill_of_materials(&self, dependencies: &[Dependency]) -> Vec<BomEntry>;
}

pub struct DependencyService<T = HttpTransport> {
    transport: T,
    fs: Box<dyn FileSystem>,
}

impl<T: Transport> DependencyService<T> {
    pub fn new(transport: T) -> Self {
        Self::with_fs(transport, RealFileSystem::new())
    }

    pub fn with_fs(transport: T, fs: impl FileSystem + 'static) -> Self {
        Self {
            transport,
            fs: Box::new(fs),
        }
    }

    fn load(&self, path: &Path) -> Result<BuildpackToml, DependencyError> {
        let content =
            self.fs
                .read_to_string(path)
                .map_err(|source| DependencyError::ReadBuildpackToml {
                    path: path.to_path_buf(),
                    source,
                })?;

        toml::from_str(&content).map_err(|source| DependencyError::ParseBuildpackToml {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl<T: Transport> DependencyManager for DependencyService<T> {
    fn resolve(
        &self,
        path: &Path,
        id: &str,
        version: &str,
        stack: &str,
    ) -> Result<Dependency, DependencyError> {
        let buildpack = self.load(path)?;

        let constraint = if version.is_empty() || version == "default" {
            buildpack
                .metadata
                .default_versions
                .get(id)
                .cloned()
                .unwrap_or_else(|| "*".to_string())
        } else {
            version.to_string()
        };

        let requirement =
            parse_constraint(&constraint).map_err(|source| DependencyError::InvalidConstraint {
                id: id.to_string(),
                constraint: constraint.clone(),
                source,
            })?;

        let mut supported = Vec::new();
        let mut compatible = Vec::new();
        for dependency in buildpack.metadata.dependencies {
            if dependency.id != id || !dependency.supports_stack(stack) {
                continue;
            }

            let parsed =
                parse_version(&dependency.version).map_err(|source| DependencyError::InvalidVersion {
                    id: id.to_string(),
                    version: dependency.version.clone(),
                    source,
                })?;

            supported.push(dependency.version.clone());
            if requirement.matches(&parsed) {
                compatible.push((parsed, dependency));
            }
        }

        compatible.sort_by(|(a, _), (b, _)| b.cmp(a));

        match compatible.into_iter().next() {
            Some((_, dependency)) => {
                debug!(id, constraint = %constraint, version = %dependency.version, "Resolved dependency");
                Ok(dependency)
            }
            None => Err(DependencyError::NoCompatibleVersion {
                id: id.to_string(),
                constraint,
                stack: stack.to_string(),
                supported,
            }),
        }
    }

    fn deliver(
        &self,
        dependency: &Dependency,
        cnb_path: &Path,
        destination: &Path,
        platform_path: &Path,
    ) -> Result<(), DependencyError> {
        let mapped =
            DependencyMappingResolver::new(self.fs.as_ref()).find(&dependency.sha256, platform_path)?;
        let uri = match mapped {
            Some(uri) => {
                info!(from = %dependency.uri, to = %uri, "Using dependency mapping");
                uri
            }
            None => dependency.uri.clone(),
        };

        let bytes = self.transport.fetch(cnb_path, &uri)?;

        let actual = hex::encode(Sha256::digest(&bytes));
        if !actual.eq_ignore_ascii_case(&dependency.sha256) {
            return Err(DependencyError::ChecksumMismatch {
                uri,
                expected: dependency.sha256.clone(),
                actual,
            });
        }

        extract(&bytes, destination, file_name_from_uri(&uri)).map_err(|source| {
            DependencyError::Extract {
                uri: uri.clone(),
                destination: destination.to_path_buf(),
                source,
            }
        })?;

        debug!(uri = %uri, destination = %destination.display(), "Delivered dependency");
        Ok(())
    }

    fn generate_bill_of_materials(&self, dependencies: &[Dependency]) -> Vec<BomEntry> {
        dependencies
            .iter()
            .map(|dependency| BomEntry {
                name: dependency.name.clone(),
                metadata: BomMetadata {
                    version: dependency.version.clone(),
                    uri: dependency.uri.clone(),
                    sha256: dependency.sha256.clone(),
                    stacks: dependency.stacks.clone(),
                    licenses: dependency.licenses.clone(),
                },
            })
            .collect()
    }
}
