//! `pyproject.toml` reading.

use super::PYPROJECT;
use crate::fs::{FileSystem, RealFileSystem};
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// What detection needs to know about a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectManifest {
    /// `tool.poetry.name` is set.
    pub detected: bool,
    /// `tool.poetry.dependencies.python`, verbatim. Empty when absent.
    pub python_version: String,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg_attr(test, mockall::automock)]
pub trait ProjectParser {
    fn parse(&self, project_dir: &Path) -> Result<ProjectManifest, ParseError>;
}

#[derive(Debug, Default, Deserialize)]
struct PyProject {
    #[serde(default)]
    tool: Tool,
}

#[derive(Debug, Default, Deserialize)]
struct Tool {
    #[serde(default)]
    poetry: PoetrySection,
}

#[derive(Debug, Default, Deserialize)]
struct PoetrySection {
    #[serde(default)]
    name: String,
    #[serde(default)]
    dependencies: PoetryDependencies,
}

#[derive(Debug, Default, Deserialize)]
struct PoetryDependencies {
    #[serde(default)]
    python: String,
}

pub struct PyProjectParser {
    fs: Box<dyn FileSystem>,
}

impl PyProjectParser {
    pub fn new() -> Self {
        Self::with_fs(RealFileSystem::new())
    }

    pub fn with_fs(fs: impl FileSystem + 'static) -> Self {
        Self { fs: Box::new(fs) }
    }
}

impl Default for PyProjectParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectParser for PyProjectParser {
    fn parse(&self, project_dir: &Path) -> Result<ProjectManifest, ParseError> {
        let path = project_dir.join(PYPROJECT);
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|source| ParseError::Read {
                path: path.clone(),
                source,
            })?;

        let project: PyProject =
            toml::from_str(&content).map_err(|source| ParseError::Decode { path, source })?;

        let poetry = project.tool.poetry;
        Ok(ProjectManifest {
            detected: !poetry.name.is_empty(),
            python_version: poetry.dependencies.python,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    fn parse(content: &str) -> Result<ProjectManifest, ParseError> {
        let fs = MockFileSystem::new();
        fs.add_file(PYPROJECT, content);
        PyProjectParser::with_fs(fs).parse(Path::new("/mock"))
    }

    #[test]
    fn test_poetry_project_with_python() {
        let manifest = parse(
            r#"
[tool.poetry]
name = "poetry-demo"
version = "0.1.0"

[tool.poetry.dependencies]
python = "^3.8"
requests = { version = "^2.25", optional = true }
"#,
        )
        .unwrap();

        assert_eq!(
            manifest,
            ProjectManifest {
                detected: true,
                python_version: "^3.8".to_string(),
            }
        );
    }

    #[test]
    fn test_poetry_project_without_python() {
        let manifest = parse("[tool.poetry]\nname = \"poetry-demo\"\n").unwrap();

        assert!(manifest.detected);
        assert_eq!(manifest.python_version, "");
    }

    #[test]
    fn test_non_poetry_project() {
        let manifest = parse(
            r#"
[build-system]
requires = ["setuptools"]

[tool.black]
line-length = 100
"#,
        )
        .unwrap();

        assert_eq!(manifest, ProjectManifest::default());
    }

    #[test]
    fn test_empty_name_is_not_detected() {
        let manifest = parse("[tool.poetry]\nname = \"\"\n[tool.poetry.dependencies]\npython = \"*\"\n")
            .unwrap();

        assert!(!manifest.detected);
        assert_eq!(manifest.python_version, "*");
    }

    #[test]
    fn test_missing_file() {
        let err = PyProjectParser::with_fs(MockFileSystem::new())
            .parse(Path::new("/mock"))
            .unwrap_err();

        match err {
            ParseError::Read { path, source } => {
                assert_eq!(path, Path::new("/mock/pyproject.toml"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_toml() {
        let err = parse("[tool.poetry\nname = ").unwrap_err();
        assert!(matches!(err, ParseError::Decode { .. }));
    }

    #[test]
    fn test_wrong_value_type() {
        let err = parse("[tool.poetry]\nname = 1\n").unwrap_err();
        assert!(matches!(err, ParseError::Decode { .. }));
    }
}
