use std::collections::BTreeMap;

use crate::plugin_system::descriptor::PluginDescriptor;
use crate::plugin_system::error::{PluginResult, PluginSystemError};
use crate::plugin_system::loader::PluginDiscovery;

/// Reverse dependency index over a set of installed descriptors.
///
/// Maps each plugin name to the installed plugins that list it in
/// `plugin_dependencies`. A plugin listing itself counts as its own dependent.
#[derive(Debug, Default, Clone)]
pub struct DependencyIndex {
    dependents: BTreeMap<String, Vec<String>>,
}

impl DependencyIndex {
    pub fn from_descriptors<'a>(descriptors: impl IntoIterator<Item = &'a PluginDescriptor>) -> Self {
        let mut dependents: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for descriptor in descriptors {
            for dependency in &descriptor.dependencies {
                let entry = dependents.entry(dependency.clone()).or_default();
                if !entry.contains(&descriptor.name) {
                    entry.push(descriptor.name.clone());
                }
            }
        }
        for names in dependents.values_mut() {
            names.sort();
        }
        Self { dependents }
    }

    /// Load every installed descriptor; the first one that fails aborts the build
    pub fn from_installed(discovery: &PluginDiscovery) -> PluginResult<Self> {
        let mut descriptors = Vec::new();
        for name in discovery.installed_names()? {
            descriptors.push(discovery.load_installed(&name)?);
        }
        Ok(Self::from_descriptors(&descriptors))
    }

    /// Installed plugins that depend on `name`, sorted
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.dependents.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// True when nothing depends on `name`
    pub fn is_free(&self, name: &str) -> bool {
        self.dependents_of(name).is_empty()
    }

    /// Fail with the full dependent list if anything depends on `name`
    pub fn ensure_free(&self, name: &str) -> PluginResult<()> {
        if self.is_free(name) {
            return Ok(());
        }
        Err(PluginSystemError::DependencyBlocked {
            plugin: name.to_string(),
            dependents: self.dependents_of(name).to_vec(),
        })
    }
}
