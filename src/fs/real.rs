use super::{DirEntry, FileSystem, FileType};
use std::fs;
use std::io;
use std::path::Path;

pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut result = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            let file_type = if path.is_file() {
                FileType::File
            } else if path.is_dir() {
                FileType::Directory
            } else {
                FileType::Symlink
            };

            result.push(DirEntry {
                path,
                name,
                file_type,
            });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("bindings")).unwrap();
        fs::write(dir.path().join("pyproject.toml"), "[tool.poetry]\n").unwrap();
        dir
    }

    #[test]
    fn test_is_dir_and_is_file() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        assert!(fs.is_dir(&temp.path().join("bindings")));
        assert!(!fs.is_dir(&temp.path().join("pyproject.toml")));
        assert!(fs.is_file(&temp.path().join("pyproject.toml")));
        assert!(fs.exists(temp.path()));
    }

    #[test]
    fn test_read_to_string_missing_file_is_not_found() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        let err = fs
            .read_to_string(&temp.path().join("missing.toml"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_read_dir() {
        let temp = create_test_dir();
        let fs = RealFileSystem::new();

        let entries = fs.read_dir(temp.path()).unwrap();
        let mut names: Vec<&str> = entries.iter().map(|e| e.file_name()).collect();
        names.sort();

        assert_eq!(names, vec!["bindings", "pyproject.toml"]);
    }
}
