use std::path::PathBuf;
use std::sync::Arc;

use crate::kernel::error::{Error, Result};
use crate::plugin_system::manager::PluginLifecycleManager;
use crate::plugin_system::traits::Hook;
use crate::repository::sync::RepositorySync;
use crate::storage::devices::load_device_config;
use crate::storage::records::{RecordStore, Repository};

/// What the boot sequence did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StartupReport {
    /// Devices loaded from configuration
    pub devices: usize,
    /// Why the device configuration could not be loaded, if it could not
    pub device_error: Option<String>,
    /// Auto-update repositories that pulled cleanly
    pub updated_repositories: Vec<String>,
    /// Repository name and error for every failed auto-update step
    pub failed_repositories: Vec<(String, String)>,
    /// Plugins reinstalled from an updated repository
    pub reinstalled: Vec<String>,
    /// Installed plugins whose descriptors were loaded into the registry
    pub loaded: Vec<String>,
    /// Plugins whose startup hook ran
    pub started: Vec<String>,
    /// Plugin name and error for every failed reinstall or startup hook
    pub plugin_failures: Vec<(String, String)>,
}

impl StartupReport {
    pub fn is_clean(&self) -> bool {
        self.device_error.is_none() && self.failed_repositories.is_empty() && self.plugin_failures.is_empty()
    }
}

/// Runs once at boot.
///
/// Failures are soft: each one is logged and recorded in the report and the
/// sequence moves on. Only the record store itself failing aborts it.
#[derive(Debug, Clone)]
pub struct StartupCoordinator {
    records: Arc<dyn RecordStore>,
    device_config: PathBuf,
    repositories: RepositorySync,
    plugins: PluginLifecycleManager,
}

impl StartupCoordinator {
    pub fn new(
        records: Arc<dyn RecordStore>,
        device_config: PathBuf,
        repositories: RepositorySync,
        plugins: PluginLifecycleManager,
    ) -> Self {
        Self { records, device_config, repositories, plugins }
    }

    pub async fn run(&self) -> Result<StartupReport> {
        let mut report = StartupReport::default();
        self.reseed_devices(&mut report).await?;
        self.auto_update(&mut report).await?;
        self.load_plugins(&mut report).await?;
        if report.devices > 0 {
            self.start_plugins(&mut report).await?;
        } else {
            log::info!("No devices configured, skipping plugin startup hooks");
        }
        log::info!(
            "Startup finished: {} device(s), {} repository update(s), {} reinstall(s), {} plugin(s) loaded, {} started",
            report.devices,
            report.updated_repositories.len(),
            report.reinstalled.len(),
            report.loaded.len(),
            report.started.len()
        );
        Ok(report)
    }

    /// Replace every device record with the contents of the configuration file
    async fn reseed_devices(&self, report: &mut StartupReport) -> Result<()> {
        self.records.replace_devices(Vec::new())?;
        let path = self.device_config.clone();
        let devices = match blocking(move || load_device_config(&path)).await? {
            Ok(devices) => devices,
            Err(e) => {
                log::error!("Ignoring device configuration {}: {}", self.device_config.display(), e);
                report.device_error = Some(e.to_string());
                return Ok(());
            }
        };
        report.devices = devices.len();
        self.records.replace_devices(devices)?;
        log::info!("Loaded {} device(s)", report.devices);
        Ok(())
    }

    /// Pull every auto-update repository and reinstall its installed plugins
    async fn auto_update(&self, report: &mut StartupReport) -> Result<()> {
        let repositories: Vec<Repository> =
            self.records.repositories()?.into_iter().filter(|r| r.auto_update).collect();
        for repository in repositories {
            if let Err(e) = self.repositories.update_one(&repository).await {
                log::warn!("Auto-update of '{}' failed: {}", repository.name, e);
                report.failed_repositories.push((repository.name.clone(), e.to_string()));
                continue;
            }
            report.updated_repositories.push(repository.name.clone());

            let plugins = self.plugins.clone();
            let source = repository.clone();
            let listing = match blocking(move || plugins.discovery().list_available(&source)).await? {
                Ok(listing) => listing,
                Err(e) => {
                    log::warn!("Could not list plugins of '{}': {}", repository.name, e);
                    report.failed_repositories.push((repository.name.clone(), e.to_string()));
                    continue;
                }
            };
            for failure in &listing.failures {
                let name = failure.plugin_name().unwrap_or("<unknown>").to_string();
                report.plugin_failures.push((name, failure.to_string()));
            }

            for plugin in listing.items.into_iter().filter(|p| p.installed) {
                let manager = self.plugins.clone();
                let source = repository.clone();
                let name = plugin.name.clone();
                match blocking(move || manager.reinstall(&name, Some(&source))).await? {
                    Ok(_) => {
                        log::info!("Reinstalled '{}' from '{}'", plugin.name, repository.name);
                        report.reinstalled.push(plugin.name);
                    }
                    Err(e) => {
                        log::error!("Reinstall of '{}' failed: {}", plugin.name, e);
                        report.plugin_failures.push((plugin.name, e.to_string()));
                    }
                }
            }
        }
        Ok(())
    }

    /// Rebuild the registry's loaded set from the plugins location
    async fn load_plugins(&self, report: &mut StartupReport) -> Result<()> {
        let plugins = self.plugins.clone();
        let listing = blocking(move || plugins.load_installed()).await??;
        for failure in &listing.failures {
            let name = failure.plugin_name().unwrap_or("<unknown>").to_string();
            log::error!("Could not load installed plugin '{}': {}", name, failure);
            report.plugin_failures.push((name, failure.to_string()));
        }
        report.loaded = listing.items;
        Ok(())
    }

    /// Call the startup hook of every loaded plugin that declares one, by name
    async fn start_plugins(&self, report: &mut StartupReport) -> Result<()> {
        let names: Vec<String> = self
            .plugins
            .registry()
            .read()
            .loaded_descriptors()
            .filter(|descriptor| descriptor.declares_hook(Hook::Startup))
            .map(|descriptor| descriptor.name.clone())
            .collect();
        for name in names {
            let registry = self.plugins.registry().clone();
            let plugin = name.clone();
            match blocking(move || registry.invoke_hook(&plugin, Hook::Startup, true)).await? {
                Ok(()) => report.started.push(name),
                Err(e) => {
                    log::error!("Startup of plugin '{}' failed: {}", name, e);
                    report.plugin_failures.push((name, e.to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Run blocking filesystem work off the async worker threads
async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| Error::Other(format!("blocking task failed: {}", e)))
}
