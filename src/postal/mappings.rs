//! Platform bindings that redirect a dependency to another URI.
//!
//! A binding directory under `<platform>/bindings/` whose `type` file reads
//! `dependency-mapping` maps sha256 checksums (file names) to URIs (file
//! contents).

use super::DependencyError;
use crate::fs::FileSystem;
use std::path::Path;

const BINDING_TYPE: &str = "dependency-mapping";

pub struct DependencyMappingResolver<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> DependencyMappingResolver<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Returns the mapped URI for `sha256`, if any binding provides one.
    pub fn find(&self, sha256: &str, platform_path: &Path) -> Result<Option<String>, DependencyError> {
        let bindings_dir = platform_path.join("bindings");
        if sha256.is_empty() || !self.fs.is_dir(&bindings_dir) {
            return Ok(None);
        }

        let read_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| DependencyError::Bindings { path, source }
        };

        let mut bindings = self
            .fs
            .read_dir(&bindings_dir)
            .map_err(read_error(&bindings_dir))?;
        bindings.sort_by(|a, b| a.name.cmp(&b.name));

        for binding in bindings.iter().filter(|b| b.is_dir()) {
            let type_path = binding.path().join("type");
            if !self.fs.is_file(&type_path) {
                continue;
            }

            let binding_type = self
                .fs
                .read_to_string(&type_path)
                .map_err(read_error(&type_path))?;
            if binding_type.trim() != BINDING_TYPE {
                continue;
            }

            let mapping_path = binding.path().join(sha256);
            if self.fs.is_file(&mapping_path) {
                let uri = self
                    .fs
                    .read_to_string(&mapping_path)
                    .map_err(read_error(&mapping_path))?;
                return Ok(Some(uri.trim().to_string()));
            }
        }

        Ok(None)
    }
}
