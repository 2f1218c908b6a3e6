//! # VectorCloud Storage
//!
//! Filesystem and persistence layer of the plugin system:
//!
//! - **[`provider`]** / **[`local`]**: the [`StorageProvider`] trait and its
//!   local-disk implementation.
//! - **[`locations`]**: the four opaque named locations (repositories,
//!   plugins, panels, assets) the lifecycle manager copies between.
//! - **[`config`]**: [`AppConfig`], loaded from JSON, YAML or TOML.
//! - **[`records`]**: repository and device records behind [`RecordStore`].
//! - **[`devices`]**: the ini device configuration file.
pub mod provider;
pub mod local;
pub mod locations;
pub mod config;
pub mod records;
pub mod devices;
pub mod error;

/// Re-export key types
pub use provider::StorageProvider;
pub use local::LocalStorageProvider;
pub use locations::{Location, Locations};
pub use config::{AppConfig, ConfigFormat};
pub use records::{Device, JsonRecordStore, NewRepository, RecordStore, Repository, RepositoryId};
pub use devices::load_device_config;
pub use error::{StorageResult, StorageSystemError};

// Test module declaration
#[cfg(test)]
mod tests;
