//! Repository and device records.
//!
//! The record store is an external collaborator; [`RecordStore`] is its
//! interface boundary and [`JsonRecordStore`] the file-backed implementation
//! the binary uses.
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::storage::error::{StorageResult, StorageSystemError};
use crate::storage::local::LocalStorageProvider;
use crate::storage::provider::StorageProvider;

/// Identifier assigned to a repository record
pub type RepositoryId = u64;

/// A tracked plugin source repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepositoryId,
    pub url: String,
    pub name: String,
    /// Working tree of the checkout
    pub local_path: PathBuf,
    pub auto_update: bool,
}

/// Fields of a repository record before an id is assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRepository {
    pub url: String,
    pub name: String,
    pub local_path: PathBuf,
    pub auto_update: bool,
}

/// A robot known to the server, keyed by serial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub serial: String,
    pub cert_file: String,
    pub ip: String,
    pub name: String,
    pub guid: String,
}

/// Persistence boundary for repository and device records
pub trait RecordStore: Send + Sync + Debug {
    /// All repositories in insertion order
    fn repositories(&self) -> StorageResult<Vec<Repository>>;

    fn repository(&self, id: RepositoryId) -> StorageResult<Option<Repository>>;

    fn insert_repository(&self, repository: NewRepository) -> StorageResult<Repository>;

    fn delete_repository(&self, id: RepositoryId) -> StorageResult<()>;

    fn set_auto_update(&self, id: RepositoryId, auto_update: bool) -> StorageResult<Repository>;

    fn devices(&self) -> StorageResult<Vec<Device>>;

    /// Delete every device and insert `devices` in their place
    fn replace_devices(&self, devices: Vec<Device>) -> StorageResult<()>;

    /// First tracked repository, the default install source
    fn first_repository(&self) -> StorageResult<Option<Repository>> {
        Ok(self.repositories()?.into_iter().next())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordFile {
    next_id: RepositoryId,
    repositories: Vec<Repository>,
    devices: Vec<Device>,
}

/// Record store persisted as a single JSON document
#[derive(Debug)]
pub struct JsonRecordStore {
    provider: Arc<dyn StorageProvider>,
    file_name: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonRecordStore {
    pub fn new(provider: Arc<dyn StorageProvider>, file_name: impl Into<PathBuf>) -> Self {
        Self { provider, file_name: file_name.into(), lock: Mutex::new(()) }
    }

    /// Store backed by the file at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let file_name = path.file_name()
            .map(PathBuf::from)
            .ok_or_else(|| StorageSystemError::InvalidPath {
                path: path.to_path_buf(),
                reason: "records file has no file name".to_string(),
            })?;
        Ok(Self::new(Arc::new(LocalStorageProvider::named("records", parent)), file_name))
    }

    fn read(&self) -> StorageResult<RecordFile> {
        if !self.provider.exists(&self.file_name) {
            return Ok(RecordFile { next_id: 1, ..RecordFile::default() });
        }
        let data = self.provider.read_to_string(&self.file_name)?;
        serde_json::from_str(&data).map_err(|e| StorageSystemError::DeserializationError {
            format: "json".to_string(),
            source: Box::new(e),
        })
    }

    fn write(&self, records: &RecordFile) -> StorageResult<()> {
        let data = serde_json::to_string_pretty(records).map_err(|e| StorageSystemError::SerializationError {
            format: "json".to_string(),
            source: Box::new(e),
        })?;
        self.provider.write_string(&self.file_name, &data)
    }

    fn modify<T>(&self, f: impl FnOnce(&mut RecordFile) -> StorageResult<T>) -> StorageResult<T> {
        let _guard = self.lock.lock().map_err(|_| StorageSystemError::OperationFailed {
            operation: "lock_records".to_string(),
            path: Some(self.provider.path_of(&self.file_name)),
            message: "record store lock poisoned".to_string(),
        })?;
        let mut records = self.read()?;
        let value = f(&mut records)?;
        self.write(&records)?;
        Ok(value)
    }
}

impl RecordStore for JsonRecordStore {
    fn repositories(&self) -> StorageResult<Vec<Repository>> {
        Ok(self.read()?.repositories)
    }

    fn repository(&self, id: RepositoryId) -> StorageResult<Option<Repository>> {
        Ok(self.read()?.repositories.into_iter().find(|r| r.id == id))
    }

    fn insert_repository(&self, repository: NewRepository) -> StorageResult<Repository> {
        self.modify(|records| {
            let id = records.next_id.max(1);
            records.next_id = id + 1;
            let record = Repository {
                id,
                url: repository.url,
                name: repository.name,
                local_path: repository.local_path,
                auto_update: repository.auto_update,
            };
            records.repositories.push(record.clone());
            Ok(record)
        })
    }

    fn delete_repository(&self, id: RepositoryId) -> StorageResult<()> {
        self.modify(|records| {
            let before = records.repositories.len();
            records.repositories.retain(|r| r.id != id);
            if records.repositories.len() == before {
                return Err(StorageSystemError::RecordNotFound { kind: "repository", key: id.to_string() });
            }
            Ok(())
        })
    }

    fn set_auto_update(&self, id: RepositoryId, auto_update: bool) -> StorageResult<Repository> {
        self.modify(|records| {
            let record = records.repositories.iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| StorageSystemError::RecordNotFound { kind: "repository", key: id.to_string() })?;
            record.auto_update = auto_update;
            Ok(record.clone())
        })
    }

    fn devices(&self) -> StorageResult<Vec<Device>> {
        Ok(self.read()?.devices)
    }

    fn replace_devices(&self, devices: Vec<Device>) -> StorageResult<()> {
        self.modify(|records| {
            records.devices = devices;
            Ok(())
        })
    }
}
