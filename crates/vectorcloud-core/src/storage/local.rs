use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use crate::storage::error::{StorageResult, StorageSystemError};
use crate::storage::provider::StorageProvider;

/// Local filesystem storage provider
#[derive(Clone)]
pub struct LocalStorageProvider {
    name: String,
    base_path: PathBuf,
}

impl LocalStorageProvider {
    /// Create a new local storage provider with the given base path
    pub fn new(base_path: PathBuf) -> Self {
        Self::named("local", base_path)
    }

    /// Create a provider labelled after the location it serves
    pub fn named(name: impl Into<String>, base_path: PathBuf) -> Self {
        Self { name: name.into(), base_path }
    }

    /// Resolve a relative path against the base path
    fn resolve_path<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.base_path.join(path)
    }
}

impl StorageProvider for LocalStorageProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> &Path {
        &self.base_path
    }

    fn path_of(&self, path: &Path) -> PathBuf {
        self.resolve_path(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve_path(path).exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.resolve_path(path).is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.resolve_path(path).is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> StorageResult<()> {
        let full_path = self.resolve_path(path);
        fs::create_dir_all(&full_path).map_err(|e| StorageSystemError::io(e, "create_dir_all", full_path))
    }

    fn read_to_string(&self, path: &Path) -> StorageResult<String> {
        let full_path = self.resolve_path(path);
        fs::read_to_string(&full_path).map_err(|e| StorageSystemError::io(e, "read_to_string", full_path))
    }

    fn write_string(&self, path: &Path, contents: &str) -> StorageResult<()> {
        let full_path = self.resolve_path(path);

        let parent = match full_path.parent() {
            Some(parent) => parent.to_path_buf(),
            None => {
                return Err(StorageSystemError::OperationFailed {
                    operation: "write_string".to_string(),
                    path: Some(full_path),
                    message: "Cannot write to path without parent directory".to_string(),
                });
            }
        };
        fs::create_dir_all(&parent).map_err(|e| StorageSystemError::io(e, "create_dir_all", parent.clone()))?;

        // Write to a sibling temp file, then persist over the target
        let temp_file = NamedTempFile::new_in(&parent)
            .map_err(|e| StorageSystemError::io(e, "create_temp_file", parent.clone()))?;
        temp_file.as_file().write_all(contents.as_bytes())
            .map_err(|e| StorageSystemError::io(e, "write_to_temp_file", temp_file.path().to_path_buf()))?;
        temp_file.persist(&full_path)
            .map_err(|e| StorageSystemError::io(e.error, "persist_temp_file", full_path.clone()))?;

        Ok(())
    }

    fn import_file(&self, source: &Path, dest: &Path) -> StorageResult<()> {
        let full_to = self.resolve_path(dest);
        fs::copy(source, &full_to)
            .map(|_| ())
            .map_err(|e| StorageSystemError::io(e, "copy", source.to_path_buf())) // Report error with source path
    }

    fn remove_file(&self, path: &Path) -> StorageResult<()> {
        let full_path = self.resolve_path(path);
        fs::remove_file(&full_path).map_err(|e| StorageSystemError::io(e, "remove_file", full_path))
    }

    fn remove_dir_all(&self, path: &Path) -> StorageResult<()> {
        let full_path = self.resolve_path(path);
        fs::remove_dir_all(&full_path).map_err(|e| StorageSystemError::io(e, "remove_dir_all", full_path))
    }

    fn read_dir(&self, path: &Path) -> StorageResult<Vec<PathBuf>> {
        let full_path = self.resolve_path(path);
        let entries = fs::read_dir(&full_path).map_err(|e| StorageSystemError::io(e, "read_dir", full_path.clone()))?;
        let mut result = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| StorageSystemError::io(e, "read_dir_entry", full_path.clone()))?;
            let path = entry.path();

            // Convert back to a relative path if possible
            if let Ok(rel_path) = path.strip_prefix(&self.base_path) {
                result.push(rel_path.to_path_buf());
            } else {
                result.push(path);
            }
        }

        result.sort();
        Ok(result)
    }
}

impl fmt::Debug for LocalStorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStorageProvider")
            .field("name", &self.name)
            .field("base_path", &self.base_path)
            .finish()
    }
}
