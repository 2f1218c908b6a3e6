//! # VectorCloud Kernel Errors
//!
//! Defines the application-wide [`Error`], aggregating the typed errors of
//! every subsystem, and the matching [`Result`] alias.
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::event::error::EventSystemError;
use crate::plugin_system::error::PluginSystemError;
use crate::repository::error::RepositoryError;
use crate::storage::error::StorageSystemError;

/// Custom error type for the VectorCloud core
#[derive(Debug, ThisError)]
pub enum Error {
    /// Specific, typed plugin system error
    #[error("Plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    /// Repository clone, pull or removal error
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Specific, typed storage system error
    #[error("Storage system error: {0}")]
    StorageSystem(#[from] StorageSystemError),

    #[error("Event system error: {0}")]
    EventSystem(#[from] EventSystemError),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

// Helper to create an I/O error with context
impl Error {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        Error::StorageSystem(StorageSystemError::io(source, operation, path))
    }
}
