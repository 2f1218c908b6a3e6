use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json;
#[cfg(feature = "yaml-config")]
use serde_yaml;
#[cfg(feature = "toml-config")]
use toml;

use crate::kernel::constants;
use crate::storage::error::{StorageResult, StorageSystemError};
use crate::storage::locations::Locations;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// Application configuration: where things live and how long things may take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root holding one checkout per tracked repository
    pub repositories_dir: PathBuf,
    /// Active plugin units
    pub plugins_dir: PathBuf,
    /// Active panel templates
    pub panels_dir: PathBuf,
    /// Active static script assets
    pub assets_dir: PathBuf,
    /// JSON file backing the record store
    pub records_file: PathBuf,
    /// Ini file listing the known devices
    pub device_config_file: PathBuf,
    /// Program used for clone and pull
    pub git_program: String,
    /// Deadline for a single clone or pull
    pub sync_timeout_secs: Option<u64>,
    /// Deadline for a single plugin run
    pub run_timeout_secs: Option<u64>,
    /// Namespace busy/free events are broadcast on
    pub channel_namespace: String,
    /// Buffered events per subscriber before it starts lagging
    pub channel_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::with_base_dir(Path::new("."))
    }
}

impl AppConfig {
    /// Default layout rooted at `base`
    pub fn with_base_dir(base: &Path) -> Self {
        Self {
            repositories_dir: base.join(constants::REPOSITORIES_DIR),
            plugins_dir: base.join(constants::PLUGINS_DIR),
            panels_dir: base.join(constants::PANELS_DIR),
            assets_dir: base.join(constants::ASSETS_DIR),
            records_file: base.join(constants::RECORDS_FILE),
            device_config_file: base.join(constants::DEVICE_CONFIG_FILE),
            git_program: "git".to_string(),
            sync_timeout_secs: None,
            run_timeout_secs: None,
            channel_namespace: constants::DEFAULT_CHANNEL_NAMESPACE.to_string(),
            channel_capacity: constants::DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Load a configuration file, picking the format from its extension.
    ///
    /// Relative paths in the file resolve against the file's directory.
    pub fn load(path: &Path) -> StorageResult<Self> {
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| StorageSystemError::UnsupportedConfigFormat(path.display().to_string()))?;
        let data = std::fs::read_to_string(path)
            .map_err(|e| StorageSystemError::io(e, "read_config", path.to_path_buf()))?;
        let mut config = Self::deserialize(&data, format)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Deserialize from string based on format
    pub fn deserialize(data: &str, format: ConfigFormat) -> StorageResult<Self> {
        let de_err = |format: ConfigFormat, e: Box<dyn std::error::Error + Send + Sync>| {
            StorageSystemError::DeserializationError { format: format.extension().to_string(), source: e }
        };
        match format {
            ConfigFormat::Json => serde_json::from_str(data).map_err(|e| de_err(format, Box::new(e))),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(|e| de_err(format, Box::new(e))),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(|e| de_err(format, Box::new(e))),
        }
    }

    /// Serialize to string based on format
    pub fn serialize(&self, format: ConfigFormat) -> StorageResult<String> {
        let ser_err = |format: ConfigFormat, e: Box<dyn std::error::Error + Send + Sync>| {
            StorageSystemError::SerializationError { format: format.extension().to_string(), source: e }
        };
        match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self).map_err(|e| ser_err(format, Box::new(e))),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(self).map_err(|e| ser_err(format, Box::new(e))),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| ser_err(format, Box::new(e))),
        }
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [
            &mut self.repositories_dir,
            &mut self.plugins_dir,
            &mut self.panels_dir,
            &mut self.assets_dir,
            &mut self.records_file,
            &mut self.device_config_file,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    pub fn sync_timeout(&self) -> Option<Duration> {
        self.sync_timeout_secs.map(Duration::from_secs)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }

    /// Local providers for the four named locations
    pub fn locations(&self) -> Locations {
        Locations::local(&self.repositories_dir, &self.plugins_dir, &self.panels_dir, &self.assets_dir)
    }
}
