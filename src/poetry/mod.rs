//! The Poetry buildpack itself.
//!
//! [`PoetryDetector`] passes for projects whose `pyproject.toml` names a
//! Poetry package and asks for `cpython` and `pip` at build time.
//! [`PoetryBuilder`] installs Poetry with `pip` into the `poetry` layer and
//! exposes its site-packages directory on `PYTHONPATH`.

pub mod build;
pub mod detect;
pub mod install;
pub mod pyproject;
pub mod site;

pub use build::{BuildError, PoetryBuilder};
pub use detect::PoetryDetector;
pub use install::{InstallError, InstallProcess, PoetryInstallProcess};
pub use pyproject::{ParseError, ProjectManifest, ProjectParser, PyProjectParser};
pub use site::{SitePackageProcess, SitePackagesError, SiteProcess};

/// Dependency id, plan provision and layer name.
pub const POETRY: &str = "poetry";
pub const CPYTHON: &str = "cpython";
pub const PIP: &str = "pip";

pub const PYPROJECT: &str = "pyproject.toml";
pub const BUILDPACK_TOML: &str = "buildpack.toml";

pub const PYTHONPATH: &str = "PYTHONPATH";
pub const PYTHONUSERBASE: &str = "PYTHONUSERBASE";
