use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::storage::error::StorageResult;
use crate::storage::local::LocalStorageProvider;
use crate::storage::provider::StorageProvider;

/// The named filesystem locations the plugin system works in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// Root holding one checkout per tracked repository
    Repositories,
    /// Active plugin units
    Plugins,
    /// Active panel templates
    Panels,
    /// Active static script assets
    Assets,
}

impl Location {
    pub const ALL: [Location; 4] = [Location::Repositories, Location::Plugins, Location::Panels, Location::Assets];

    pub fn label(&self) -> &'static str {
        match self {
            Location::Repositories => "repositories",
            Location::Plugins => "plugins",
            Location::Panels => "panels",
            Location::Assets => "assets",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps each [`Location`] to the provider serving it.
#[derive(Debug, Clone)]
pub struct Locations {
    repositories: Arc<dyn StorageProvider>,
    plugins: Arc<dyn StorageProvider>,
    panels: Arc<dyn StorageProvider>,
    assets: Arc<dyn StorageProvider>,
}

impl Locations {
    pub fn new(
        repositories: Arc<dyn StorageProvider>,
        plugins: Arc<dyn StorageProvider>,
        panels: Arc<dyn StorageProvider>,
        assets: Arc<dyn StorageProvider>,
    ) -> Self {
        Self { repositories, plugins, panels, assets }
    }

    /// Local directories for every location
    pub fn local(repositories: &Path, plugins: &Path, panels: &Path, assets: &Path) -> Self {
        Self::new(
            Arc::new(LocalStorageProvider::named(Location::Repositories.label(), repositories.to_path_buf())),
            Arc::new(LocalStorageProvider::named(Location::Plugins.label(), plugins.to_path_buf())),
            Arc::new(LocalStorageProvider::named(Location::Panels.label(), panels.to_path_buf())),
            Arc::new(LocalStorageProvider::named(Location::Assets.label(), assets.to_path_buf())),
        )
    }

    pub fn get(&self, location: Location) -> &Arc<dyn StorageProvider> {
        match location {
            Location::Repositories => &self.repositories,
            Location::Plugins => &self.plugins,
            Location::Panels => &self.panels,
            Location::Assets => &self.assets,
        }
    }

    /// Ensure every location root exists
    pub fn ensure_directories(&self) -> StorageResult<()> {
        for location in Location::ALL {
            self.get(location).create_dir_all(Path::new(""))?;
        }
        Ok(())
    }
}
