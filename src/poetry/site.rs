use super::PYTHONUSERBASE;
use crate::pexec::{environ_with, Executable, Execution, ExecutionError, SharedBuffer};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("failed to locate site packages:\n{stderr}\nerror: {source}")]
pub struct SitePackagesError {
    pub stderr: String,
    #[source]
    pub source: ExecutionError,
}

/// Asks Python where user site-packages live for a given user base.
#[cfg_attr(test, mockall::automock)]
pub trait SitePackageProcess {
    /// Returns python's stdout as is, trailing newline included.
    fn execute(&self, target_layer_path: &Path) -> Result<String, SitePackagesError>;
}

pub struct SiteProcess<E> {
    executable: E,
}

impl<E: Executable> SiteProcess<E> {
    pub fn new(executable: E) -> Self {
        Self { executable }
    }
}

impl<E: Executable> SitePackageProcess for SiteProcess<E> {
    fn execute(&self, target_layer_path: &Path) -> Result<String, SitePackagesError> {
        let stdout = SharedBuffer::new();
        let stderr = SharedBuffer::new();

        debug!(user_base = %target_layer_path.display(), "Locating user site-packages");

        self.executable
            .execute(Execution {
                args: vec!["-m".to_string(), "site".to_string(), "--user-site".to_string()],
                env: environ_with(PYTHONUSERBASE, target_layer_path.as_os_str()),
                stdout: Some(Box::new(stdout.clone())),
                stderr: Some(Box::new(stderr.clone())),
                ..Default::default()
            })
            .map_err(|source| SitePackagesError {
                stderr: stderr.contents(),
                source,
            })?;

        Ok(stdout.contents())
    }
}
