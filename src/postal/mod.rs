//! Dependency resolution and delivery.
//!
//! Dependencies are declared in the buildpack's own `buildpack.toml` under
//! `[[metadata.dependencies]]`. [`DependencyService`] picks the best match
//! for an id, version constraint and stack, downloads and verifies it, and
//! produces Bill of Materials entries for it.

pub mod archive;
pub mod dependency;
pub mod mappings;
pub mod service;
pub mod transport;

pub use dependency::{parse_constraint, parse_version, Dependency};
pub use mappings::DependencyMappingResolver;
pub use service::{DependencyManager, DependencyService};
pub use transport::{HttpTransport, Transport};

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("failed to read {}: {source}", .path.display())]
    ReadBuildpackToml {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    ParseBuildpackToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid version constraint {constraint:?} for {id:?}: {source}")]
    InvalidConstraint {
        id: String,
        constraint: String,
        #[source]
        source: semver::Error,
    },

    #[error("invalid version {version:?} for dependency {id:?}: {source}")]
    InvalidVersion {
        id: String,
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error(
        "failed to satisfy {id:?} dependency version constraint {constraint:?}: no compatible versions on {stack:?} stack. Supported versions are: [{}]",
        .supported.join(", ")
    )]
    NoCompatibleVersion {
        id: String,
        constraint: String,
        stack: String,
        supported: Vec<String>,
    },

    #[error("failed to read dependency mappings from {}: {source}", .path.display())]
    Bindings {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("failed to download {uri}: {source}")]
    Http {
        uri: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to download {uri}: HTTP {status}")]
    HttpStatus { uri: String, status: u16 },

    #[error("failed to read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported dependency URI: {0}")]
    UnsupportedUri(String),

    #[error("checksum does not match for {uri}: expected sha256 {expected}, got {actual}")]
    ChecksumMismatch {
        uri: String,
        expected: String,
        actual: String,
    },

    #[error("failed to extract {uri} into {}: {source}", .destination.display())]
    Extract {
        uri: String,
        destination: PathBuf,
        #[source]
        source: io::Error,
    },
}
