//! # VectorCloud Core
//!
//! Plugin lifecycle management for the VectorCloud robot server: tracked
//! plugin repositories, plugin discovery, dependency-safe install and
//! uninstall, plugin execution with busy/free notifications, and the boot
//! sequence that ties them together.
pub mod event;
pub mod kernel;
pub mod plugin_system;
pub mod repository;
pub mod storage;
pub mod utils;

// Re-export key public types for the binary and plugin crates
pub use event::{BroadcastChannel, ChannelEvent, NotificationChannel, RunRequest};
pub use kernel::error::Error as KernelError;
pub use kernel::{Application, StartupCoordinator, StartupReport};
pub use plugin_system::{
    Namespace, Plugin, PluginDescriptor, PluginError, PluginLifecycleManager, PluginOptions, PluginRunner,
    PluginSystemError, SharedPluginRegistry,
};
pub use repository::{GitBackend, GitCli, RepositoryError, RepositorySync};
pub use storage::{AppConfig, Device, RecordStore, Repository, StorageProvider};

#[cfg(test)]
mod tests;
