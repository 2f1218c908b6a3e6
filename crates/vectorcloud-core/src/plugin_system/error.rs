//! # VectorCloud Plugin System Errors
//!
//! Defines error types specific to the plugin lifecycle.
//!
//! [`PluginSystemError`] covers install, uninstall and reinstall failures,
//! descriptor loading, module resolution and plugin execution.
//! [`DescriptorLoadCause`] records why a descriptor could not be read.
use std::path::PathBuf;
use std::time::Duration;

use crate::plugin_system::traits::{Hook, PluginError};
use crate::storage::error::StorageSystemError;

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("Plugin '{0}' is already installed")]
    AlreadyInstalled(String),

    #[error("No plugin named '{0}' is installed")]
    NotInstalled(String),

    #[error("Plugin '{plugin}' is required by: {}", dependents.join(", "))]
    DependencyBlocked { plugin: String, dependents: Vec<String> },

    #[error("Failed to load descriptor for plugin '{plugin_name}' from '{path}': {cause}")]
    DescriptorLoad {
        plugin_name: String,
        path: PathBuf,
        #[source]
        cause: DescriptorLoadCause,
    },

    #[error("Plugin '{plugin}' not found in repository '{repository}'")]
    NotInRepository { plugin: String, repository: String },

    #[error("No repository is tracked to install from")]
    NoRepository,

    #[error("Failed to copy {kind} '{asset}' of plugin '{plugin}': {source}")]
    AssetCopy {
        plugin: String,
        asset: String,
        kind: &'static str,
        #[source]
        source: StorageSystemError,
    },

    #[error("Failed to remove {kind} '{asset}' of plugin '{plugin}': {source}")]
    AssetRemoval {
        plugin: String,
        asset: String,
        kind: &'static str,
        #[source]
        source: StorageSystemError,
    },

    #[error("Invalid plugin name '{name}': {reason}")]
    InvalidPluginName { name: String, reason: String },

    #[error("No executable module registered for plugin '{0}'")]
    ModuleNotFound(String),

    #[error("A module named '{name}' is already registered in the {namespace} namespace")]
    ModuleAlreadyRegistered { name: String, namespace: String },

    #[error("Hook '{hook}' of plugin '{plugin}' failed: {source}")]
    HookFailed {
        plugin: String,
        hook: Hook,
        #[source]
        source: PluginError,
    },

    #[error("Plugin '{plugin}' failed: {source}")]
    ExecutionFailed {
        plugin: String,
        #[source]
        source: PluginError,
    },

    #[error("Plugin '{plugin}' did not finish within {limit:?}")]
    Timeout { plugin: String, limit: Duration },

    #[error("Plugin '{plugin}' panicked: {message}")]
    Panicked { plugin: String, message: String },

    #[error(transparent)]
    Storage(#[from] StorageSystemError),
}

/// Why a descriptor could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum DescriptorLoadCause {
    #[error(transparent)]
    Storage(#[from] StorageSystemError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(String),
}

impl PluginSystemError {
    pub fn descriptor_load(plugin_name: &str, path: PathBuf, cause: impl Into<DescriptorLoadCause>) -> Self {
        PluginSystemError::DescriptorLoad {
            plugin_name: plugin_name.to_string(),
            path,
            cause: cause.into(),
        }
    }

    /// Name of the plugin the error concerns, when there is one
    pub fn plugin_name(&self) -> Option<&str> {
        match self {
            PluginSystemError::AlreadyInstalled(name)
            | PluginSystemError::NotInstalled(name)
            | PluginSystemError::ModuleNotFound(name) => Some(name),
            PluginSystemError::DependencyBlocked { plugin, .. }
            | PluginSystemError::NotInRepository { plugin, .. }
            | PluginSystemError::AssetCopy { plugin, .. }
            | PluginSystemError::AssetRemoval { plugin, .. }
            | PluginSystemError::HookFailed { plugin, .. }
            | PluginSystemError::ExecutionFailed { plugin, .. }
            | PluginSystemError::Timeout { plugin, .. }
            | PluginSystemError::Panicked { plugin, .. } => Some(plugin),
            PluginSystemError::DescriptorLoad { plugin_name, .. } => Some(plugin_name),
            PluginSystemError::InvalidPluginName { name, .. }
            | PluginSystemError::ModuleAlreadyRegistered { name, .. } => Some(name),
            PluginSystemError::NoRepository | PluginSystemError::Storage(_) => None,
        }
    }
}

/// Shorthand for results produced by the plugin system
pub type PluginResult<T> = std::result::Result<T, PluginSystemError>;
