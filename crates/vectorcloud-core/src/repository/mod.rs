//! # VectorCloud Repository Sync
//!
//! Tracked plugin repositories: cloning a URL into the repositories
//! location, pulling updates and removing checkouts. Git runs behind the
//! [`GitBackend`] trait; [`GitCli`] drives the command-line client.
pub mod error;
pub mod git;
pub mod sync;

pub use error::{GitError, RepositoryError};
pub use git::{GitBackend, GitCli};
pub use sync::{derive_repository_name, RepositorySync, SyncOutcome};
