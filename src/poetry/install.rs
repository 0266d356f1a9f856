use super::{POETRY, PYTHONUSERBASE};
use crate::pexec::{environ_with, Executable, Execution, ExecutionError, SharedBuffer};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("failed to configure poetry:\n{output}\nerror: {source}")]
pub struct InstallError {
    /// Combined stdout and stderr of pip.
    pub output: String,
    #[source]
    pub source: ExecutionError,
}

/// Installs Poetry from a directory of distributions into a layer.
#[cfg_attr(test, mockall::automock)]
pub trait InstallProcess {
    fn execute(&self, src_path: &Path, target_layer_path: &Path) -> Result<(), InstallError>;
}

pub struct PoetryInstallProcess<E> {
    executable: E,
}

impl<E: Executable> PoetryInstallProcess<E> {
    pub fn new(executable: E) -> Self {
        Self { executable }
    }
}

impl<E: Executable> InstallProcess for PoetryInstallProcess<E> {
    fn execute(&self, src_path: &Path, target_layer_path: &Path) -> Result<(), InstallError> {
        let buffer = SharedBuffer::new();
        let args = vec![
            "install".to_string(),
            POETRY.to_string(),
            "--user".to_string(),
            format!("--find-links={}", src_path.display()),
        ];

        debug!(args = ?args, target = %target_layer_path.display(), "Installing poetry with pip");

        self.executable
            .execute(Execution {
                args,
                env: environ_with(PYTHONUSERBASE, target_layer_path.as_os_str()),
                stdout: Some(Box::new(buffer.clone())),
                merge_stderr: true,
                ..Default::default()
            })
            .map_err(|source| InstallError {
                output: buffer.contents(),
                source,
            })
    }
}
