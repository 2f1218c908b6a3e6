use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::plugin_system::error::DescriptorLoadCause;
use crate::plugin_system::traits::Hook;
use crate::utils::fs::{check_plugin_name, check_single_component};

/// Metadata a plugin unit carries, read without executing any plugin code.
///
/// The name is not part of the document; it comes from the unit's file stem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    #[serde(skip)]
    pub name: String,

    #[serde(rename = "plugin_description")]
    pub description: String,

    /// Opaque settings passed through to the UI
    #[serde(rename = "plugin_settings", default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,

    /// Opaque icon set passed through to the UI
    #[serde(rename = "plugin_icons", default, skip_serializing_if = "Option::is_none")]
    pub icons: Option<Value>,

    #[serde(
        rename = "plugin_panels",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub panels: Vec<PanelSpec>,

    /// Script asset file names
    #[serde(
        rename = "plugin_js",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub scripts: Vec<String>,

    /// Names of plugins that must stay installed while this one is
    #[serde(
        rename = "plugin_dependencies",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub dependencies: Vec<String>,

    #[serde(
        rename = "plugin_hooks",
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "HookFlags::is_empty"
    )]
    pub hooks: HookFlags,
}

/// A UI panel contributed by a plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelSpec {
    /// Template file name inside the plugin's directory
    pub template: String,
    /// Remaining panel fields, kept for the UI
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Which optional hooks the plugin's module implements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookFlags {
    pub on_install: bool,
    pub on_uninstall: bool,
    pub on_startup: bool,
}

impl HookFlags {
    pub fn is_empty(&self) -> bool {
        !(self.on_install || self.on_uninstall || self.on_startup)
    }

    pub fn declares(&self, hook: Hook) -> bool {
        match hook {
            Hook::Install => self.on_install,
            Hook::Uninstall => self.on_uninstall,
            Hook::Startup => self.on_startup,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl PluginDescriptor {
    /// Parse a unit document for plugin `name`
    pub fn from_json(name: &str, data: &str) -> Result<Self, DescriptorLoadCause> {
        let mut descriptor: PluginDescriptor = serde_json::from_str(data)?;
        descriptor.name = name.to_string();
        descriptor.validate().map_err(DescriptorLoadCause::Invalid)?;
        Ok(descriptor)
    }

    /// Render the unit document
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Asset and dependency names must be single path components
    pub fn validate(&self) -> Result<(), String> {
        for panel in &self.panels {
            check_single_component(&panel.template)
                .map_err(|reason| format!("panel template '{}': {}", panel.template, reason))?;
        }
        for script in &self.scripts {
            check_single_component(script).map_err(|reason| format!("script '{}': {}", script, reason))?;
        }
        for dependency in &self.dependencies {
            check_plugin_name(dependency).map_err(|reason| format!("dependency '{}': {}", dependency, reason))?;
        }
        Ok(())
    }

    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.iter().any(|d| d == name)
    }

    pub fn declares_hook(&self, hook: Hook) -> bool {
        self.hooks.declares(hook)
    }

    /// Panel template file names in declaration order
    pub fn panel_templates(&self) -> impl Iterator<Item = &str> {
        self.panels.iter().map(|p| p.template.as_str())
    }
}

/// Builder for creating a plugin descriptor
pub struct DescriptorBuilder {
    descriptor: PluginDescriptor,
}

impl DescriptorBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            descriptor: PluginDescriptor {
                name: name.to_string(),
                description: String::new(),
                settings: None,
                icons: None,
                panels: Vec::new(),
                scripts: Vec::new(),
                dependencies: Vec::new(),
                hooks: HookFlags::default(),
            },
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.descriptor.description = description.to_string();
        self
    }

    pub fn settings(mut self, settings: Value) -> Self {
        self.descriptor.settings = Some(settings);
        self
    }

    pub fn icons(mut self, icons: Value) -> Self {
        self.descriptor.icons = Some(icons);
        self
    }

    /// Add a panel rendered from `template`
    pub fn panel(mut self, template: &str) -> Self {
        self.descriptor.panels.push(PanelSpec { template: template.to_string(), extra: serde_json::Map::new() });
        self
    }

    pub fn script(mut self, script: &str) -> Self {
        self.descriptor.scripts.push(script.to_string());
        self
    }

    pub fn dependency(mut self, name: &str) -> Self {
        self.descriptor.dependencies.push(name.to_string());
        self
    }

    /// Declare that the module implements `hook`
    pub fn hook(mut self, hook: Hook) -> Self {
        match hook {
            Hook::Install => self.descriptor.hooks.on_install = true,
            Hook::Uninstall => self.descriptor.hooks.on_uninstall = true,
            Hook::Startup => self.descriptor.hooks.on_startup = true,
        }
        self
    }

    pub fn build(self) -> PluginDescriptor {
        self.descriptor
    }
}
