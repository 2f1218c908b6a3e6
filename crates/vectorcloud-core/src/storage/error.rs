//! # VectorCloud Storage Errors
//!
//! Defines error types specific to the storage layer.
//!
//! [`StorageSystemError`] covers file I/O inside the named locations, record
//! store (de)serialization, application configuration parsing and the device
//! configuration file.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageSystemError {
    #[error("I/O error during operation '{operation}' on path '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found at path: {0}")]
    FileNotFound(PathBuf),

    #[error("Serialization to '{format}' failed: {source}")]
    SerializationError {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Deserialization from '{format}' failed: {source}")]
    DeserializationError {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Unsupported configuration format: {0}")]
    UnsupportedConfigFormat(String),

    #[error("Invalid device configuration in section '{section}': missing key '{key}'")]
    MissingDeviceKey { section: String, key: String },

    #[error("Duplicate device serial in configuration: {0}")]
    DuplicateDevice(String),

    #[error("Record not found: {kind} '{key}'")]
    RecordNotFound { kind: &'static str, key: String },

    #[error("Storage operation '{operation}' failed for path '{}': {message}", path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "<unknown>".into()))]
    OperationFailed {
        operation: String,
        path: Option<PathBuf>,
        message: String,
    },

    #[error("Invalid path provided: '{path}': {reason}")]
    InvalidPath { path: PathBuf, reason: String },
}

// Helper for creating Io errors, ensuring path is always included.
impl StorageSystemError {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        StorageSystemError::Io {
            source,
            operation: operation.into(),
            path,
        }
    }

    /// True when the underlying cause is a missing file or directory.
    pub fn is_not_found(&self) -> bool {
        match self {
            StorageSystemError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            StorageSystemError::FileNotFound(_) => true,
            _ => false,
        }
    }
}

/// Shorthand for results produced by the storage layer
pub type StorageResult<T> = std::result::Result<T, StorageSystemError>;
