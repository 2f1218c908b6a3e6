use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::event::channel::BroadcastChannel;
use crate::kernel::constants;
use crate::kernel::error::Result;
use crate::kernel::startup::{StartupCoordinator, StartupReport};
use crate::plugin_system::loader::PluginDiscovery;
use crate::plugin_system::manager::PluginLifecycleManager;
use crate::plugin_system::registry::SharedPluginRegistry;
use crate::plugin_system::runner::PluginRunner;
use crate::repository::git::{GitBackend, GitCli};
use crate::repository::sync::RepositorySync;
use crate::storage::config::AppConfig;
use crate::storage::locations::{Location, Locations};
use crate::storage::records::{JsonRecordStore, RecordStore};

/// Main application struct holding every wired subsystem
#[derive(Debug, Clone)]
pub struct Application {
    config: AppConfig,
    locations: Locations,
    records: Arc<dyn RecordStore>,
    registry: SharedPluginRegistry,
    channel: Arc<BroadcastChannel>,
    repositories: RepositorySync,
    plugins: PluginLifecycleManager,
    runner: PluginRunner,
}

impl Application {
    /// Build the application from configuration, using the JSON record store
    /// and the git command-line client
    pub fn new(config: AppConfig) -> Result<Self> {
        log::info!("Initializing {} v{}", constants::APP_NAME, constants::APP_VERSION);
        let records = Arc::new(JsonRecordStore::open(&config.records_file)?);
        let git = Arc::new(GitCli::new(config.git_program.clone()).with_timeout(config.sync_timeout()));
        Ok(Self::with_parts(config, records, git))
    }

    /// Build the application around the given record store and git backend
    pub fn with_parts(config: AppConfig, records: Arc<dyn RecordStore>, git: Arc<dyn GitBackend>) -> Self {
        let locations = config.locations();
        let registry = SharedPluginRegistry::default();
        let channel = Arc::new(BroadcastChannel::new(&config.channel_namespace, config.channel_capacity));

        let repositories =
            RepositorySync::new(Arc::clone(&records), Arc::clone(locations.get(Location::Repositories)), git);
        let plugins = PluginLifecycleManager::new(&locations, Arc::clone(&records), registry.clone());
        let runner = PluginRunner::new(PluginDiscovery::new(&locations), registry.clone(), channel.clone())
            .with_timeout(config.run_timeout());

        Self { config, locations, records, registry, channel, repositories, plugins, runner }
    }

    /// Create every location root
    pub fn initialize(&self) -> Result<()> {
        self.locations.ensure_directories()?;
        for location in Location::ALL {
            log::debug!("{} location: {}", location, self.locations.get(location).root().display());
        }
        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }

    /// Registry modules are added to before any plugin runs
    pub fn registry(&self) -> &SharedPluginRegistry {
        &self.registry
    }

    pub fn channel(&self) -> &Arc<BroadcastChannel> {
        &self.channel
    }

    pub fn repositories(&self) -> &RepositorySync {
        &self.repositories
    }

    pub fn plugins(&self) -> &PluginLifecycleManager {
        &self.plugins
    }

    pub fn discovery(&self) -> &PluginDiscovery {
        self.plugins.discovery()
    }

    pub fn runner(&self) -> &PluginRunner {
        &self.runner
    }

    pub fn startup_coordinator(&self) -> StartupCoordinator {
        StartupCoordinator::new(
            Arc::clone(&self.records),
            self.config.device_config_file.clone(),
            self.repositories.clone(),
            self.plugins.clone(),
        )
    }

    /// Run the boot sequence once
    pub async fn startup(&self) -> Result<StartupReport> {
        self.initialize()?;
        self.startup_coordinator().run().await
    }

    /// Serve inbound `run_plugin` payloads until the sender closes
    pub async fn serve(&self, requests: mpsc::Receiver<Value>) {
        self.runner.clone().serve(requests).await
    }
}
