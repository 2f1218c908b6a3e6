use std::fmt::Debug;
use std::path::{Path, PathBuf};
use crate::storage::error::StorageResult;

/// Trait for storage providers backing one named location.
///
/// Every path handed to a provider is relative to the location root, except
/// the `source` of [`StorageProvider::import_file`] which points outside it.
pub trait StorageProvider: Send + Sync + Debug {
    /// Get the name of this provider
    fn name(&self) -> &str;

    /// Absolute root of the location
    fn root(&self) -> &Path;

    /// Resolve a location-relative path to an absolute one
    fn path_of(&self, path: &Path) -> PathBuf;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if a path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if a path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Create a directory and all its parent directories
    fn create_dir_all(&self, path: &Path) -> StorageResult<()>;

    /// Read a file to a string
    fn read_to_string(&self, path: &Path) -> StorageResult<String>;

    /// Write a string to a file, replacing it atomically
    fn write_string(&self, path: &Path, contents: &str) -> StorageResult<()>;

    /// Copy a file from anywhere on disk into this location
    fn import_file(&self, source: &Path, dest: &Path) -> StorageResult<()>;

    /// Remove a file
    fn remove_file(&self, path: &Path) -> StorageResult<()>;

    /// Remove a directory and all its contents
    fn remove_dir_all(&self, path: &Path) -> StorageResult<()>;

    /// List all entries in a directory, relative to the location root
    fn read_dir(&self, path: &Path) -> StorageResult<Vec<PathBuf>>;
}
