//! Layers: host-managed directories with build/launch/cache visibility and
//! environment modifications.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayerError {
    #[error("failed to create layer directory {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read layer content metadata {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse layer content metadata {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode layer content metadata: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Environment modifications keyed by `NAME.<op>`, one file per key on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment(BTreeMap<String, String>);

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepend(&mut self, name: &str, value: impl Into<String>, delim: &str) {
        self.0.insert(format!("{}.prepend", name), value.into());
        self.0.insert(format!("{}.delim", name), delim.to_string());
    }

    pub fn append(&mut self, name: &str, value: impl Into<String>, delim: &str) {
        self.0.insert(format!("{}.append", name), value.into());
        self.0.insert(format!("{}.delim", name), delim.to_string());
    }

    pub fn override_value(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(format!("{}.override", name), value.into());
    }

    pub fn default_value(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(format!("{}.default", name), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Writes each key as a file in `dir`. Nothing is created when empty.
    pub fn write_to(&self, dir: &Path) -> Result<(), LayerError> {
        if self.is_empty() {
            return Ok(());
        }

        fs::create_dir_all(dir).map_err(|source| LayerError::Write {
            path: dir.to_path_buf(),
            source,
        })?;

        for (key, value) in &self.0 {
            let path = dir.join(key);
            fs::write(&path, value).map_err(|source| LayerError::Write { path, source })?;
        }

        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub path: PathBuf,
    pub build: bool,
    pub launch: bool,
    pub cache: bool,
    pub shared_env: Environment,
    pub build_env: Environment,
    pub launch_env: Environment,
    pub metadata: toml::Table,
}

/// On-disk form of `<layers>/<name>.toml`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LayerContentMetadata {
    #[serde(default)]
    launch: bool,
    #[serde(default)]
    build: bool,
    #[serde(default)]
    cache: bool,
    #[serde(default, skip_serializing_if = "toml::Table::is_empty")]
    metadata: toml::Table,
}

impl Layer {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            build: false,
            launch: false,
            cache: false,
            shared_env: Environment::new(),
            build_env: Environment::new(),
            launch_env: Environment::new(),
            metadata: toml::Table::new(),
        }
    }

    /// Writes `<layers_dir>/<name>.toml` and the `env`, `env.build` and
    /// `env.launch` directories inside the layer.
    pub fn write(&self, layers_dir: &Path) -> Result<(), LayerError> {
        let content = toml::to_string(&LayerContentMetadata {
            launch: self.launch,
            build: self.build,
            cache: self.cache,
            metadata: self.metadata.clone(),
        })?;

        let path = layers_dir.join(format!("{}.toml", self.name));
        fs::write(&path, content).map_err(|source| LayerError::Write { path, source })?;

        self.shared_env.write_to(&self.path.join("env"))?;
        self.build_env.write_to(&self.path.join("env.build"))?;
        self.launch_env.write_to(&self.path.join("env.launch"))?;

        Ok(())
    }
}

/// The layer store handed to a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layers {
    pub path: PathBuf,
}

impl Layers {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the layer directory if needed and restores flags and metadata
    /// left by a previous build.
    pub fn get(&self, name: &str) -> Result<Layer, LayerError> {
        let layer_path = self.path.join(name);
        fs::create_dir_all(&layer_path).map_err(|source| LayerError::Create {
            path: layer_path.clone(),
            source,
        })?;

        let mut layer = Layer::new(name, layer_path);

        let metadata_path = self.path.join(format!("{}.toml", name));
        let content = match fs::read_to_string(&metadata_path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(layer),
            Err(source) => {
                return Err(LayerError::Read {
                    path: metadata_path,
                    source,
                })
            }
        };

        let stored: LayerContentMetadata =
            toml::from_str(&content).map_err(|source| LayerError::Parse {
                path: metadata_path,
                source,
            })?;

        layer.launch = stored.launch;
        layer.build = stored.build;
        layer.cache = stored.cache;
        layer.metadata = stored.metadata;

        Ok(layer)
    }
}
