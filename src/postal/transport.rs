//! Fetching dependency artifacts.

use super::DependencyError;
use reqwest::blocking::Client;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub trait Transport {
    /// Returns the artifact bytes at `uri`. `file://` URIs that are not
    /// absolute resolve against `root` (the buildpack directory).
    fn fetch(&self, root: &Path, uri: &str) -> Result<Vec<u8>, DependencyError>;
}

/// `http(s)://` through a blocking `reqwest` client, `file://` from disk.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, DependencyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DependencyError::HttpClient)?;
        Ok(Self { client })
    }

    fn fetch_http(&self, uri: &str) -> Result<Vec<u8>, DependencyError> {
        let http_error = |source| DependencyError::Http {
            uri: uri.to_string(),
            source,
        };

        let response = self.client.get(uri).send().map_err(http_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DependencyError::HttpStatus {
                uri: uri.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(http_error)?;
        Ok(bytes.to_vec())
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, root: &Path, uri: &str) -> Result<Vec<u8>, DependencyError> {
        if let Some(path) = uri.strip_prefix("file://") {
            let path = Path::new(path);
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                root.join(path)
            };
            debug!(path = %path.display(), "Reading dependency from disk");
            return fs::read(&path).map_err(|source| DependencyError::File { path, source });
        }

        if uri.starts_with("http://") || uri.starts_with("https://") {
            debug!(uri, "Downloading dependency");
            return self.fetch_http(uri);
        }

        Err(DependencyError::UnsupportedUri(uri.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn transport() -> HttpTransport {
        HttpTransport::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_fetch_relative_file_uri_uses_root() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("deps")).unwrap();
        fs::write(temp.path().join("deps").join("poetry.whl"), b"wheel").unwrap();

        let bytes = transport()
            .fetch(temp.path(), "file://deps/poetry.whl")
            .unwrap();
        assert_eq!(bytes, b"wheel");
    }

    #[test]
    fn test_fetch_absolute_file_uri() {
        let temp = TempDir::new().unwrap();
        let artifact = temp.path().join("poetry.tgz");
        fs::write(&artifact, b"archive").unwrap();

        let uri = format!("file://{}", artifact.display());
        let bytes = transport().fetch(Path::new("/unused"), &uri).unwrap();
        assert_eq!(bytes, b"archive");
    }

    #[test]
    fn test_fetch_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = transport()
            .fetch(temp.path(), "file://missing.tgz")
            .unwrap_err();
        assert!(matches!(err, DependencyError::File { .. }));
    }

    #[test]
    fn test_fetch_unsupported_scheme() {
        let err = transport()
            .fetch(Path::new("/"), "ftp://example.com/poetry.tgz")
            .unwrap_err();
        assert!(matches!(err, DependencyError::UnsupportedUri(_)));
    }
}
