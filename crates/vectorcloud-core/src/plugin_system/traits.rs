use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::kernel::constants;

/// Options a plugin is constructed with, as received from the caller
pub type PluginOptions = serde_json::Map<String, Value>;

/// Constructs a plugin instance from its name and the caller's options
pub type PluginFactory =
    Arc<dyn Fn(&str, &PluginOptions) -> std::result::Result<Box<dyn Plugin>, PluginError> + Send + Sync>;

/// Error type for plugin code
#[derive(Debug, Clone, PartialEq)]
pub enum PluginError {
    InitError(String),
    ExecutionError(String),
    HookError(String),
    InvalidOption { key: String, message: String },
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginError::InitError(msg) => write!(f, "Plugin initialization error: {}", msg),
            PluginError::ExecutionError(msg) => write!(f, "Plugin execution error: {}", msg),
            PluginError::HookError(msg) => write!(f, "Plugin hook error: {}", msg),
            PluginError::InvalidOption { key, message } => write!(f, "Invalid plugin option '{}': {}", key, message),
        }
    }
}

impl std::error::Error for PluginError {}

/// Optional lifecycle hooks a descriptor can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    Install,
    Uninstall,
    Startup,
}

impl Hook {
    /// Call this hook on a plugin instance
    pub fn invoke(self, plugin: &mut dyn Plugin) -> std::result::Result<(), PluginError> {
        match self {
            Hook::Install => plugin.on_install(),
            Hook::Uninstall => plugin.on_uninstall(),
            Hook::Startup => plugin.on_startup(),
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Install => f.write_str("on_install"),
            Hook::Uninstall => f.write_str("on_uninstall"),
            Hook::Startup => f.write_str("on_startup"),
        }
    }
}

/// Executable side of a plugin.
///
/// Instances are built by a registered [`PluginFactory`] with the plugin name
/// and the caller's options. Hooks are only called when the plugin's
/// descriptor declares them, so the defaults are never reached for declared
/// hooks unless the plugin chooses to keep them.
pub trait Plugin: Send {
    /// The name of the plugin
    fn name(&self) -> &str;

    /// Execute the plugin and return its output
    fn run(&mut self) -> std::result::Result<Value, PluginError>;

    /// Called once after the plugin's files are installed
    fn on_install(&mut self) -> std::result::Result<(), PluginError> {
        Ok(())
    }

    /// Called during uninstall, after assets are removed and before the unit is
    fn on_uninstall(&mut self) -> std::result::Result<(), PluginError> {
        Ok(())
    }

    /// Called at server startup when at least one device is configured
    fn on_startup(&mut self) -> std::result::Result<(), PluginError> {
        Ok(())
    }
}

/// Target device of a run, taken from the `vector_id` option.
///
/// Absent or null yields an empty id; non-string values use their JSON text.
pub fn target_device_id(options: &PluginOptions) -> String {
    match options.get(constants::VECTOR_ID_OPTION) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(id)) => id.clone(),
        Some(other) => other.to_string(),
    }
}
