//! poetry-buildpack - Cloud Native Buildpack that installs Poetry
//!
//! The buildpack takes part in a build when the application's
//! `pyproject.toml` declares a Poetry project. It then asks the platform for
//! `cpython` and `pip`, installs Poetry with `pip install --user` into its own
//! layer, and prepends the layer's site-packages directory to `PYTHONPATH`.
//!
//! # Example Usage
//!
//! ```no_run
//! use poetry_buildpack::cnb::{run_detect, DetectInvocation};
//! use poetry_buildpack::poetry::{PoetryDetector, PyProjectParser};
//! use std::path::PathBuf;
//!
//! let detector = PoetryDetector::new(PyProjectParser::new());
//! let exit_code = run_detect(
//!     &detector,
//!     &DetectInvocation {
//!         working_dir: PathBuf::from("/workspace"),
//!         cnb_path: PathBuf::from("/cnb/buildpacks/poetry"),
//!         platform_dir: PathBuf::from("/platform"),
//!         plan_path: PathBuf::from("/tmp/plan.toml"),
//!     },
//! )?;
//! # Ok::<(), poetry_buildpack::cnb::LifecycleError>(())
//! ```
//!
//! # Project Structure
//!
//! - [`cnb`]: buildpack side of the lifecycle contract (plans, layers, BOM)
//! - [`postal`]: dependency resolution, delivery and bill of materials
//! - [`pexec`]: subprocess execution
//! - [`poetry`]: detection and build for Poetry
//! - [`fs`]: filesystem abstraction
//! - [`config`], [`cli`], [`util`]: runtime configuration, arguments, logging

pub mod cli;
pub mod cnb;
pub mod config;
pub mod fs;
pub mod pexec;
pub mod poetry;
pub mod postal;
pub mod util;

pub use cnb::{Builder, DetectOutcome, Detector};
pub use config::{BuildpackConfig, ConfigError};
pub use poetry::{PoetryBuilder, PoetryDetector};
pub use postal::{DependencyService, HttpTransport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
