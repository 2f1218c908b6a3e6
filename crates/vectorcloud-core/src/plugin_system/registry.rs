use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::plugin_system::descriptor::PluginDescriptor;
use crate::plugin_system::error::{PluginResult, PluginSystemError};
use crate::plugin_system::traits::{Hook, Plugin, PluginError, PluginFactory, PluginOptions};

/// Where an executable module is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Modules of plugins installed from a repository
    Plugins,
    /// Fallback namespace for modules shipped with the server
    CustomPlugins,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Plugins => f.write_str("plugins"),
            Namespace::CustomPlugins => f.write_str("custom_plugins"),
        }
    }
}

/// Executable modules by namespace, plus the descriptors of loaded plugins.
#[derive(Default)]
pub struct PluginRegistry {
    modules: HashMap<(Namespace, String), PluginFactory>,
    loaded: BTreeMap<String, PluginDescriptor>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut modules: Vec<String> = self.modules.keys().map(|(ns, name)| format!("{}.{}", ns, name)).collect();
        modules.sort();
        f.debug_struct("PluginRegistry")
            .field("modules", &modules)
            .field("loaded", &self.loaded.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module factory
    pub fn register_module(&mut self, namespace: Namespace, name: &str, factory: PluginFactory) -> PluginResult<()> {
        let key = (namespace, name.to_string());
        if self.modules.contains_key(&key) {
            return Err(PluginSystemError::ModuleAlreadyRegistered {
                name: name.to_string(),
                namespace: namespace.to_string(),
            });
        }
        log::debug!("Registered module {}.{}", namespace, name);
        self.modules.insert(key, factory);
        Ok(())
    }

    /// Register a module from a constructor function
    pub fn register<F>(&mut self, namespace: Namespace, name: &str, factory: F) -> PluginResult<()>
    where
        F: Fn(&str, &PluginOptions) -> Result<Box<dyn Plugin>, PluginError> + Send + Sync + 'static,
    {
        self.register_module(namespace, name, Arc::new(factory))
    }

    pub fn has_module(&self, namespace: Namespace, name: &str) -> bool {
        self.modules.contains_key(&(namespace, name.to_string()))
    }

    pub fn module(&self, namespace: Namespace, name: &str) -> Option<PluginFactory> {
        self.modules.get(&(namespace, name.to_string())).cloned()
    }

    /// Find the module for `name`.
    ///
    /// The primary namespace only counts while the plugin is installed;
    /// otherwise, or if it has no module there, the fallback is tried.
    pub fn resolve(&self, name: &str, installed: bool) -> PluginResult<PluginFactory> {
        if installed {
            if let Some(factory) = self.module(Namespace::Plugins, name) {
                return Ok(factory);
            }
        }
        self.module(Namespace::CustomPlugins, name)
            .ok_or_else(|| PluginSystemError::ModuleNotFound(name.to_string()))
    }

    /// Record a plugin's descriptor as loaded
    pub fn mark_loaded(&mut self, descriptor: PluginDescriptor) {
        self.loaded.insert(descriptor.name.clone(), descriptor);
    }

    /// Drop a plugin from the loaded set
    pub fn unload(&mut self, name: &str) -> Option<PluginDescriptor> {
        self.loaded.remove(name)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains_key(name)
    }

    pub fn loaded(&self, name: &str) -> Option<&PluginDescriptor> {
        self.loaded.get(name)
    }

    /// Names of loaded plugins, sorted
    pub fn loaded_names(&self) -> Vec<String> {
        self.loaded.keys().cloned().collect()
    }

    /// Loaded descriptors in name order
    pub fn loaded_descriptors(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.loaded.values()
    }

    /// Replace the whole loaded set
    pub fn replace_loaded(&mut self, descriptors: impl IntoIterator<Item = PluginDescriptor>) {
        self.loaded = descriptors.into_iter().map(|d| (d.name.clone(), d)).collect();
    }
}

/// Thread-safe handle to a [`PluginRegistry`]
#[derive(Debug, Clone, Default)]
pub struct SharedPluginRegistry {
    inner: Arc<RwLock<PluginRegistry>>,
}

impl SharedPluginRegistry {
    pub fn new(registry: PluginRegistry) -> Self {
        Self { inner: Arc::new(RwLock::new(registry)) }
    }

    // A panic while holding the lock leaves the maps intact, so poisoning is ignored.
    pub fn read(&self) -> RwLockReadGuard<'_, PluginRegistry> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, PluginRegistry> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register<F>(&self, namespace: Namespace, name: &str, factory: F) -> PluginResult<()>
    where
        F: Fn(&str, &PluginOptions) -> Result<Box<dyn Plugin>, PluginError> + Send + Sync + 'static,
    {
        self.write().register(namespace, name, factory)
    }

    pub fn resolve(&self, name: &str, installed: bool) -> PluginResult<PluginFactory> {
        self.read().resolve(name, installed)
    }

    /// Instantiate the module for `name` with no options and call `hook` on it
    pub fn invoke_hook(&self, name: &str, hook: Hook, installed: bool) -> PluginResult<()> {
        let factory = self.resolve(name, installed)?;
        let hook_failed = |source| PluginSystemError::HookFailed { plugin: name.to_string(), hook, source };
        let mut plugin = factory(name, &PluginOptions::new()).map_err(hook_failed)?;
        log::debug!("Calling {} of plugin '{}'", hook, name);
        hook.invoke(plugin.as_mut()).map_err(hook_failed)
    }
}
