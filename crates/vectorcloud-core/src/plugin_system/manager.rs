use std::path::Path;
use std::sync::Arc;

use crate::plugin_system::dependency::DependencyIndex;
use crate::plugin_system::descriptor::PluginDescriptor;
use crate::plugin_system::error::{PluginResult, PluginSystemError};
use crate::plugin_system::loader::{repository_plugin_dir, repository_unit_path, Listing, PluginDiscovery};
use crate::plugin_system::registry::SharedPluginRegistry;
use crate::plugin_system::traits::Hook;
use crate::storage::locations::{Location, Locations};
use crate::storage::provider::StorageProvider;
use crate::storage::records::{RecordStore, Repository};
use crate::utils::fs::{check_plugin_name, unit_file_name};

const PANEL_KIND: &str = "panel template";
const SCRIPT_KIND: &str = "script";

/// What an uninstall removed and what it found already gone
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UninstallReport {
    pub plugin: String,
    /// Asset files that were removed
    pub removed_assets: Vec<String>,
    /// Declared asset files that were not present
    pub missing_assets: Vec<String>,
    /// False when a forced uninstall could not read the descriptor
    pub descriptor_loaded: bool,
    /// Uninstall hook error a forced uninstall carried on past
    pub hook_error: Option<String>,
}

/// Installs, uninstalls and reinstalls plugins.
///
/// Operations are blocking and hold no per-name lock; callers serialize
/// lifecycle operations on the same plugin name. A failure partway through
/// an install leaves whatever was already copied in place.
#[derive(Debug, Clone)]
pub struct PluginLifecycleManager {
    plugins: Arc<dyn StorageProvider>,
    panels: Arc<dyn StorageProvider>,
    assets: Arc<dyn StorageProvider>,
    discovery: PluginDiscovery,
    registry: SharedPluginRegistry,
    records: Arc<dyn RecordStore>,
}

impl PluginLifecycleManager {
    pub fn new(locations: &Locations, records: Arc<dyn RecordStore>, registry: SharedPluginRegistry) -> Self {
        Self {
            plugins: Arc::clone(locations.get(Location::Plugins)),
            panels: Arc::clone(locations.get(Location::Panels)),
            assets: Arc::clone(locations.get(Location::Assets)),
            discovery: PluginDiscovery::new(locations),
            registry,
            records,
        }
    }

    pub fn discovery(&self) -> &PluginDiscovery {
        &self.discovery
    }

    pub fn registry(&self) -> &SharedPluginRegistry {
        &self.registry
    }

    /// Install `name` from `repository`, or from the first tracked repository.
    ///
    /// Copies the unit, then every declared panel template and script, then
    /// calls the install hook if the descriptor declares one.
    pub fn install(&self, name: &str, repository: Option<&Repository>) -> PluginResult<PluginDescriptor> {
        check_plugin_name(name).map_err(|reason| PluginSystemError::InvalidPluginName {
            name: name.to_string(),
            reason,
        })?;
        if self.discovery.is_installed(name) {
            return Err(PluginSystemError::AlreadyInstalled(name.to_string()));
        }

        let repository = match repository {
            Some(repository) => repository.clone(),
            None => self.records.first_repository()?.ok_or(PluginSystemError::NoRepository)?,
        };
        let source_unit = repository_unit_path(&repository, name);
        if !source_unit.is_file() {
            return Err(PluginSystemError::NotInRepository {
                plugin: name.to_string(),
                repository: repository.name.clone(),
            });
        }

        log::info!("Installing plugin '{}' from repository '{}'", name, repository.name);
        self.plugins.create_dir_all(Path::new(""))?;
        self.plugins.import_file(&source_unit, &unit_file_name(name))?;

        // Assets come from what the installed copy declares
        let descriptor = self.discovery.load_installed(name)?;
        let source_dir = repository_plugin_dir(&repository, name);
        for template in descriptor.panel_templates() {
            copy_asset(&*self.panels, &source_dir, name, template, PANEL_KIND)?;
        }
        for script in &descriptor.scripts {
            copy_asset(&*self.assets, &source_dir, name, script, SCRIPT_KIND)?;
        }

        self.registry.write().mark_loaded(descriptor.clone());

        if descriptor.declares_hook(Hook::Install) {
            self.registry.invoke_hook(name, Hook::Install, true)?;
        }
        log::info!("Installed plugin '{}'", name);
        Ok(descriptor)
    }

    /// Rebuild the registry's loaded set from every installed unit.
    ///
    /// Returns the names now loaded; units that fail to load are left out and
    /// reported in the listing's failures.
    pub fn load_installed(&self) -> PluginResult<Listing<String>> {
        let installed = self.discovery.list_installed()?;
        let names: Vec<String> = installed.items.iter().map(|d| d.name.clone()).collect();
        self.registry.write().replace_loaded(installed.items);
        log::debug!("Loaded plugins: {:?}", names);
        Ok(Listing { items: names, failures: installed.failures })
    }

    /// True when no installed plugin lists `name` as a dependency
    pub fn check_dependents(&self, name: &str) -> PluginResult<bool> {
        Ok(DependencyIndex::from_installed(&self.discovery)?.is_free(name))
    }

    /// Installed plugins that list `name` as a dependency, sorted
    pub fn dependents_of(&self, name: &str) -> PluginResult<Vec<String>> {
        Ok(DependencyIndex::from_installed(&self.discovery)?.dependents_of(name).to_vec())
    }

    /// Uninstall `name`.
    ///
    /// Without `force`, fails with [`PluginSystemError::DependencyBlocked`]
    /// before touching anything if an installed plugin depends on it. Declared
    /// assets are removed first, then the uninstall hook runs, then the unit
    /// is removed. Assets that are already gone are logged and skipped. A
    /// failing hook stops a plain uninstall before the unit is removed; a
    /// forced one records it in the report and removes the unit anyway.
    pub fn uninstall(&self, name: &str, force: bool) -> PluginResult<UninstallReport> {
        if !self.discovery.is_installed(name) {
            return Err(PluginSystemError::NotInstalled(name.to_string()));
        }
        if !force {
            DependencyIndex::from_installed(&self.discovery)?.ensure_free(name)?;
        }

        let mut report = UninstallReport { plugin: name.to_string(), ..UninstallReport::default() };
        let descriptor = match self.discovery.load_installed(name) {
            Ok(descriptor) => Some(descriptor),
            Err(e) if force => {
                log::warn!("Forcing removal of plugin '{}' without its descriptor: {}", name, e);
                None
            }
            Err(e) => return Err(e),
        };

        if let Some(descriptor) = &descriptor {
            report.descriptor_loaded = true;
            for template in descriptor.panel_templates() {
                remove_asset(&*self.panels, name, template, PANEL_KIND, &mut report)?;
            }
            for script in &descriptor.scripts {
                remove_asset(&*self.assets, name, script, SCRIPT_KIND, &mut report)?;
            }
            if descriptor.declares_hook(Hook::Uninstall) {
                match self.registry.invoke_hook(name, Hook::Uninstall, true) {
                    Ok(()) => {}
                    Err(e) if force => {
                        log::warn!("Forcing removal of plugin '{}' past its failed hook: {}", name, e);
                        report.hook_error = Some(e.to_string());
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        self.plugins.remove_file(&unit_file_name(name))?;
        self.registry.write().unload(name);
        log::info!("Uninstalled plugin '{}'", name);
        Ok(report)
    }

    /// Force-uninstall `name` if installed, then install it again.
    ///
    /// Not atomic: if the install fails the plugin stays uninstalled.
    pub fn reinstall(&self, name: &str, repository: Option<&Repository>) -> PluginResult<PluginDescriptor> {
        match self.uninstall(name, true) {
            Ok(_) | Err(PluginSystemError::NotInstalled(_)) => {}
            Err(e) => return Err(e),
        }
        self.install(name, repository)
    }
}

fn copy_asset(
    dest: &dyn StorageProvider,
    source_dir: &Path,
    plugin: &str,
    asset: &str,
    kind: &'static str,
) -> PluginResult<()> {
    dest.create_dir_all(Path::new(""))
        .and_then(|_| dest.import_file(&source_dir.join(asset), Path::new(asset)))
        .map_err(|source| PluginSystemError::AssetCopy {
            plugin: plugin.to_string(),
            asset: asset.to_string(),
            kind,
            source,
        })?;
    log::debug!("Copied {} '{}' of plugin '{}' into {}", kind, asset, plugin, dest.name());
    Ok(())
}

fn remove_asset(
    location: &dyn StorageProvider,
    plugin: &str,
    asset: &str,
    kind: &'static str,
    report: &mut UninstallReport,
) -> PluginResult<()> {
    match location.remove_file(Path::new(asset)) {
        Ok(()) => {
            report.removed_assets.push(asset.to_string());
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            log::warn!("{} '{}' of plugin '{}' was already absent", kind, asset, plugin);
            report.missing_assets.push(asset.to_string());
            Ok(())
        }
        Err(source) => Err(PluginSystemError::AssetRemoval {
            plugin: plugin.to_string(),
            asset: asset.to_string(),
            kind,
            source,
        }),
    }
}
