//! # VectorCloud Plugin System
//!
//! Discovery, installation and execution of plugins.
//!
//! A plugin has two halves. Its unit is a JSON descriptor stored as
//! `<name>/<name>.json` in a repository checkout and copied to
//! `<name>.json` in the plugins location on install; a plugin is installed
//! exactly when that file exists. Its executable module is a factory
//! registered in the [`PluginRegistry`] under the plugin's name.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`descriptor`]**: the unit document ([`PluginDescriptor`]) and its builder.
//! - **[`loader`]**: [`PluginDiscovery`], listing what a checkout offers and
//!   what is installed without running any plugin code.
//! - **[`dependency`]**: reverse dependency index used to block uninstalls.
//! - **[`manager`]**: [`PluginLifecycleManager`] with install, uninstall and reinstall.
//! - **[`registry`]**: executable modules by namespace and the loaded-descriptor set.
//! - **[`runner`]**: [`PluginRunner`] and the busy/free [`BusyGuard`].
//! - **[`traits`]**: the [`Plugin`] trait and its hooks.
//! - **[`error`]**: [`PluginSystemError`](error::PluginSystemError).
pub mod dependency;
pub mod descriptor;
pub mod error;
pub mod loader;
pub mod manager;
pub mod registry;
pub mod runner;
pub mod traits;

pub use dependency::DependencyIndex;
pub use descriptor::{DescriptorBuilder, HookFlags, PanelSpec, PluginDescriptor};
pub use error::{PluginResult, PluginSystemError};
pub use loader::{AvailablePlugin, InstalledOverview, Listing, PluginDiscovery};
pub use manager::{PluginLifecycleManager, UninstallReport};
pub use registry::{Namespace, PluginRegistry, SharedPluginRegistry};
pub use runner::{BusyGuard, PluginRunner};
pub use traits::{Hook, Plugin, PluginError, PluginFactory, PluginOptions};

#[cfg(test)]
mod tests;
