//! # VectorCloud Repository Errors
//!
//! [`RepositoryError`] covers cloning, pulling and removing tracked plugin
//! repositories. [`GitError`] describes what went wrong inside a single git
//! invocation and is carried as the source of the clone and sync variants.
use std::path::PathBuf;
use thiserror::Error;

use crate::storage::error::StorageSystemError;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("'{command}' did not finish within {seconds}s")]
    Timeout { command: String, seconds: u64 },
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Clone of '{url}' failed: {source}")]
    Clone {
        url: String,
        #[source]
        source: GitError,
    },

    #[error("Cannot clone '{url}': checkout directory '{}' already exists", path.display())]
    CheckoutExists { url: String, path: PathBuf },

    #[error("Cannot derive a repository name from URL '{0}'")]
    InvalidUrl(String),

    #[error("Pull of repository '{repository}' failed: {source}")]
    Sync {
        repository: String,
        #[source]
        source: GitError,
    },

    #[error("Repository not found: {0}")]
    NotFound(String),

    #[error("Repository storage error: {0}")]
    Storage(#[from] StorageSystemError),
}

impl RepositoryError {
    /// True for every way `add` can fail to produce a checkout
    pub fn is_clone_error(&self) -> bool {
        matches!(
            self,
            RepositoryError::Clone { .. } | RepositoryError::CheckoutExists { .. } | RepositoryError::InvalidUrl(_)
        )
    }
}
