//! Subprocess execution behind a narrow trait so callers can be tested
//! without spawning real processes.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

/// A single invocation of an executable.
///
/// The child's environment is exactly `env`; nothing is inherited implicitly.
#[derive(Default)]
pub struct Execution {
    pub args: Vec<String>,
    pub env: Vec<(OsString, OsString)>,
    pub dir: Option<PathBuf>,
    pub stdout: Option<Box<dyn Write + Send>>,
    pub stderr: Option<Box<dyn Write + Send>>,
    /// Send stderr down the stdout pipe (`2>&1`). `stdout` then receives both
    /// streams in the order the child wrote them and `stderr` is unused.
    pub merge_stderr: bool,
}

impl fmt::Debug for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Execution")
            .field("args", &self.args)
            .field("env_len", &self.env.len())
            .field("dir", &self.dir)
            .field("stdout", &self.stdout.is_some())
            .field("stderr", &self.stderr.is_some())
            .field("merge_stderr", &self.merge_stderr)
            .finish()
    }
}

impl Execution {
    /// Value of the last `key` entry in `env`.
    pub fn env_var(&self, key: &str) -> Option<&OsStr> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to start {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("{command} failed: {}", describe_exit(.code))]
    Failed { command: String, code: Option<i32> },

    #[error("failed to capture output of {command}: {source}")]
    Capture {
        command: String,
        #[source]
        source: io::Error,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait Executable {
    fn execute(&self, execution: Execution) -> Result<(), ExecutionError>;
}

/// Runs a named executable found on the child's `PATH`.
#[derive(Debug, Clone)]
pub struct CommandExecutable {
    name: String,
}

impl CommandExecutable {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Executable for CommandExecutable {
    fn execute(&self, mut execution: Execution) -> Result<(), ExecutionError> {
        let mut command = Command::new(&self.name);
        command
            .args(&execution.args)
            .env_clear()
            .envs(execution.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null());

        if let Some(dir) = &execution.dir {
            command.current_dir(dir);
        }

        debug!(
            command = %self.name,
            args = ?execution.args,
            merge_stderr = execution.merge_stderr,
            "Running executable"
        );

        let status = if execution.merge_stderr {
            self.run_merged(command, &mut execution)?
        } else {
            self.run_separate(command, &mut execution)?
        };

        if !status.success() {
            return Err(ExecutionError::Failed {
                command: self.name.clone(),
                code: status.code(),
            });
        }

        Ok(())
    }
}

impl CommandExecutable {
    fn spawn_error(&self, source: io::Error) -> ExecutionError {
        ExecutionError::Spawn {
            command: self.name.clone(),
            source,
        }
    }

    fn capture_error(&self, source: io::Error) -> ExecutionError {
        ExecutionError::Capture {
            command: self.name.clone(),
            source,
        }
    }

    fn run_separate(
        &self,
        mut command: Command,
        execution: &mut Execution,
    ) -> Result<ExitStatus, ExecutionError> {
        let output = command.output().map_err(|e| self.spawn_error(e))?;

        if let Some(stdout) = execution.stdout.as_mut() {
            stdout
                .write_all(&output.stdout)
                .map_err(|e| self.capture_error(e))?;
        }
        if let Some(stderr) = execution.stderr.as_mut() {
            stderr
                .write_all(&output.stderr)
                .map_err(|e| self.capture_error(e))?;
        }

        Ok(output.status)
    }

    fn run_merged(
        &self,
        mut command: Command,
        execution: &mut Execution,
    ) -> Result<ExitStatus, ExecutionError> {
        let (mut reader, writer) = os_pipe::pipe().map_err(|e| self.spawn_error(e))?;
        let stderr_writer = writer.try_clone().map_err(|e| self.spawn_error(e))?;
        command.stdout(writer).stderr(stderr_writer);

        let mut child = command.spawn().map_err(|e| self.spawn_error(e))?;
        // The parent's write ends live in `command`; close them or the read never sees EOF.
        drop(command);

        let mut output = Vec::new();
        let read = reader
            .read_to_end(&mut output)
            .map_err(|e| self.capture_error(e));
        let status = child.wait().map_err(|e| self.capture_error(e))?;
        read?;

        if let Some(stdout) = execution.stdout.as_mut() {
            stdout
                .write_all(&output)
                .map_err(|e| self.capture_error(e))?;
        }

        Ok(status)
    }
}

/// Clonable in-memory sink. Clones share the same bytes, so one buffer can
/// be handed out as both stdout and stderr.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The current process environment with `key=value` appended.
pub fn environ_with(key: &str, value: impl Into<OsString>) -> Vec<(OsString, OsString)> {
    let mut env: Vec<(OsString, OsString)> = std::env::vars_os().collect();
    env.push((OsString::from(key), value.into()));
    env
}
