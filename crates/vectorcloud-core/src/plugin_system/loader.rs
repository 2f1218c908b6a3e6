use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::plugin_system::descriptor::PluginDescriptor;
use crate::plugin_system::error::{PluginResult, PluginSystemError};
use crate::storage::error::StorageSystemError;
use crate::storage::locations::{Location, Locations};
use crate::storage::provider::StorageProvider;
use crate::storage::records::Repository;
use crate::utils::fs::{check_plugin_name, unit_file_name, unit_name};

/// Items that loaded, plus one error per item that did not.
///
/// A broken unit never hides the healthy ones.
#[derive(Debug)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub failures: Vec<PluginSystemError>,
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self { items: Vec::new(), failures: Vec::new() }
    }
}

impl<T> Listing<T> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A plugin a repository offers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailablePlugin {
    pub name: String,
    pub description: String,
    pub installed: bool,
}

/// Everything installed plugins contribute to the UI, keyed by plugin name
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct InstalledOverview {
    pub plugins: Vec<String>,
    pub icons: serde_json::Map<String, Value>,
    pub panels: serde_json::Map<String, Value>,
    pub scripts: serde_json::Map<String, Value>,
}

/// Read a descriptor from a unit file on disk
pub fn load_descriptor(name: &str, path: &Path) -> PluginResult<PluginDescriptor> {
    let data = std::fs::read_to_string(path).map_err(|e| {
        PluginSystemError::descriptor_load(name, path.to_path_buf(), StorageSystemError::io(e, "read_unit", path.to_path_buf()))
    })?;
    PluginDescriptor::from_json(name, &data)
        .map_err(|cause| PluginSystemError::descriptor_load(name, path.to_path_buf(), cause))
}

/// Directory of plugin `name` inside a repository checkout
pub fn repository_plugin_dir(repository: &Repository, name: &str) -> PathBuf {
    repository.local_path.join(name)
}

/// Unit file of plugin `name` inside a repository checkout
pub fn repository_unit_path(repository: &Repository, name: &str) -> PathBuf {
    repository_plugin_dir(repository, name).join(unit_file_name(name))
}

/// Read-only view over checkouts and the active plugin directory.
#[derive(Debug, Clone)]
pub struct PluginDiscovery {
    plugins: Arc<dyn StorageProvider>,
}

impl PluginDiscovery {
    pub fn new(locations: &Locations) -> Self {
        Self { plugins: Arc::clone(locations.get(Location::Plugins)) }
    }

    /// Absolute path of the installed unit for `name`
    pub fn unit_path(&self, name: &str) -> PathBuf {
        self.plugins.path_of(&unit_file_name(name))
    }

    /// A plugin is installed exactly when its unit is in the plugins location
    pub fn is_installed(&self, name: &str) -> bool {
        check_plugin_name(name).is_ok() && self.plugins.is_file(&unit_file_name(name))
    }

    /// Names of installed plugins, sorted
    pub fn installed_names(&self) -> PluginResult<Vec<String>> {
        let root = Path::new("");
        if !self.plugins.is_dir(root) {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = self.plugins.read_dir(root)?
            .iter()
            .filter(|path| self.plugins.is_file(path))
            .filter_map(|path| unit_name(path))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Load the descriptor of an installed plugin
    pub fn load_installed(&self, name: &str) -> PluginResult<PluginDescriptor> {
        load_descriptor(name, &self.unit_path(name))
    }

    /// Descriptors of every installed plugin
    pub fn list_installed(&self) -> PluginResult<Listing<PluginDescriptor>> {
        let mut listing = Listing::default();
        for name in self.installed_names()? {
            match self.load_installed(&name) {
                Ok(descriptor) => listing.items.push(descriptor),
                Err(e) => {
                    log::warn!("Skipping installed plugin '{}': {}", name, e);
                    listing.failures.push(e);
                }
            }
        }
        Ok(listing)
    }

    /// Plugins a checkout offers.
    ///
    /// Each immediate subdirectory whose name has no dot and which holds a
    /// unit named after it is a candidate. Results are sorted by name.
    pub fn list_available(&self, repository: &Repository) -> PluginResult<Listing<AvailablePlugin>> {
        let root = &repository.local_path;
        let entries = std::fs::read_dir(root)
            .map_err(|e| StorageSystemError::io(e, "list_repository", root.clone()))?;

        let mut candidates = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageSystemError::io(e, "list_repository", root.clone()))?;
            let Ok(name) = entry.file_name().into_string() else { continue };
            if name.contains('.') || check_plugin_name(&name).is_err() || !entry.path().is_dir() {
                continue;
            }
            if !repository_unit_path(repository, &name).is_file() {
                log::debug!("Directory '{}' in repository '{}' has no plugin unit", name, repository.name);
                continue;
            }
            candidates.push(name);
        }
        candidates.sort();

        let mut listing = Listing::default();
        for name in candidates {
            match load_descriptor(&name, &repository_unit_path(repository, &name)) {
                Ok(descriptor) => listing.items.push(AvailablePlugin {
                    installed: self.is_installed(&name),
                    name,
                    description: descriptor.description,
                }),
                Err(e) => {
                    log::warn!("Skipping plugin '{}' in repository '{}': {}", name, repository.name, e);
                    listing.failures.push(e);
                }
            }
        }
        Ok(listing)
    }

    /// Icons, panels and scripts of every installed plugin that loads
    pub fn overview(&self) -> PluginResult<InstalledOverview> {
        let listing = self.list_installed()?;
        let mut overview = InstalledOverview::default();
        for descriptor in listing.items {
            if let Some(icons) = descriptor.icons {
                overview.icons.insert(descriptor.name.clone(), icons);
            }
            if !descriptor.panels.is_empty() {
                let panels = serde_json::to_value(&descriptor.panels).unwrap_or(Value::Null);
                overview.panels.insert(descriptor.name.clone(), panels);
            }
            if !descriptor.scripts.is_empty() {
                overview.scripts.insert(descriptor.name.clone(), Value::from(descriptor.scripts));
            }
            overview.plugins.push(descriptor.name);
        }
        Ok(overview)
    }
}
