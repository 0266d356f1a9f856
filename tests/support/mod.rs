//! Shared fixtures for integration tests: a buildpack directory with a local
//! Poetry artifact, and recording stand-ins for pip and python.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use poetry_buildpack::pexec::{Executable, Execution, ExecutionError};
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const STACK: &str = "io.buildpacks.stacks.bionic";
pub const WHEEL: &str = "poetry-1.1.4-py2.py3-none-any.whl";

pub fn get_buildpack_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_poetry-buildpack"))
}

/// A gzip tarball holding a single fake wheel.
pub fn poetry_artifact() -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    let content = b"not really a wheel";
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, WHEEL, &content[..])
        .expect("Failed to append wheel");
    let tar = builder.into_inner().expect("Failed to finish tarball");

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).expect("Failed to gzip tarball");
    encoder.finish().expect("Failed to finish gzip")
}

pub fn sha256(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Writes `buildpack.toml` plus `dependencies/poetry-1.1.4.tgz` into
/// `dir`. The dependency checksum is `sha` when given, otherwise the real one.
pub fn write_buildpack(dir: &Path, sha: Option<&str>) {
    let artifact = poetry_artifact();
    let checksum = sha.map(str::to_string).unwrap_or_else(|| sha256(&artifact));

    fs::create_dir_all(dir.join("dependencies")).expect("Failed to create dependencies dir");
    fs::write(dir.join("dependencies/poetry-1.1.4.tgz"), &artifact)
        .expect("Failed to write artifact");

    let buildpack_toml = format!(
        r#"api = "0.5"

[buildpack]
id = "paketo-community/poetry"
name = "Poetry Buildpack"
version = "0.3.0"

[metadata]
include-files = ["bin/build", "bin/detect", "buildpack.toml"]

[[metadata.dependencies]]
id = "poetry"
name = "Poetry"
sha256 = "{checksum}"
stacks = ["{STACK}", "io.paketo.stacks.tiny"]
uri = "file://dependencies/poetry-1.1.4.tgz"
version = "1.1.4"
licenses = ["MIT"]

[[metadata.dependencies]]
id = "poetry"
name = "Poetry"
sha256 = "0000"
stacks = ["org.cloudfoundry.stacks.cflinuxfs3"]
uri = "file://dependencies/poetry-9.9.9.tgz"
version = "9.9.9"

[[stacks]]
id = "{STACK}"
"#
    );
    fs::write(dir.join("buildpack.toml"), buildpack_toml).expect("Failed to write buildpack.toml");
}

pub fn write_pyproject(dir: &Path, content: &str) {
    fs::write(dir.join("pyproject.toml"), content).expect("Failed to write pyproject.toml");
}

pub fn write_plan(path: &Path, launch: bool, build: bool) {
    fs::write(
        path,
        format!("[[entries]]\nname = \"poetry\"\n[entries.metadata]\nlaunch = {launch}\nbuild = {build}\n"),
    )
    .expect("Failed to write buildpack plan");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub args: Vec<String>,
    pub user_base: Option<OsString>,
    /// Entries of the `--find-links` directory at call time.
    pub find_links_entries: Vec<String>,
}

/// Records every execution and answers with canned output. `{user_base}` in
/// `stdout` is replaced with the `PYTHONUSERBASE` the call received; canned
/// stderr follows stdout into the same sink when the call merges streams.
#[derive(Clone, Default)]
pub struct RecordingExecutable {
    calls: Arc<Mutex<Vec<Call>>>,
    stdout: String,
    stderr: String,
    exit_code: Option<i32>,
}

impl RecordingExecutable {
    pub fn succeeding(stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            ..Default::default()
        }
    }

    pub fn failing(stderr: &str, code: i32) -> Self {
        Self {
            stderr: stderr.to_string(),
            exit_code: Some(code),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Executable for RecordingExecutable {
    fn execute(&self, mut execution: Execution) -> Result<(), ExecutionError> {
        let user_base = execution.env_var("PYTHONUSERBASE").map(|v| v.to_os_string());

        let find_links_entries = execution
            .args
            .iter()
            .find_map(|arg| arg.strip_prefix("--find-links="))
            .and_then(|dir| fs::read_dir(dir).ok())
            .map(|entries| {
                let mut names: Vec<String> = entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().to_string())
                    .collect();
                names.sort();
                names
            })
            .unwrap_or_default();

        self.calls.lock().unwrap().push(Call {
            args: execution.args.clone(),
            user_base: user_base.clone(),
            find_links_entries,
        });

        let user_base = user_base
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_default();
        if let Some(stdout) = execution.stdout.as_mut() {
            stdout
                .write_all(self.stdout.replace("{user_base}", &user_base).as_bytes())
                .unwrap();
        }
        let stderr = if execution.merge_stderr {
            execution.stdout.as_mut()
        } else {
            execution.stderr.as_mut()
        };
        if let Some(stderr) = stderr {
            stderr.write_all(self.stderr.as_bytes()).unwrap();
        }

        match self.exit_code {
            Some(code) => Err(ExecutionError::Failed {
                command: "fake".to_string(),
                code: Some(code),
            }),
            None => Ok(()),
        }
    }
}
