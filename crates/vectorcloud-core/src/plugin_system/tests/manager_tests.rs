use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::plugin_system::descriptor::{DescriptorBuilder, PluginDescriptor};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::manager::PluginLifecycleManager;
use crate::plugin_system::registry::{Namespace, SharedPluginRegistry};
use crate::plugin_system::tests::fixtures::{file_names, register_recording, CallLog, Workspace};
use crate::plugin_system::traits::{Hook, Plugin, PluginError};

fn weather() -> PluginDescriptor {
    DescriptorBuilder::new("weather")
        .description("shows weather")
        .panel("weather.html")
        .script("weather.js")
        .build()
}

fn snapshot(ws: &Workspace) -> (Vec<String>, Vec<String>, Vec<String>) {
    (file_names(ws.plugins_dir()), file_names(ws.panels_dir()), file_names(ws.assets_dir()))
}

#[test]
fn test_install_copies_unit_panels_and_scripts() {
    let ws = Workspace::new();
    ws.add_plugin(&weather());

    let descriptor = ws.manager().install("weather", None).unwrap();
    assert_eq!(descriptor.description, "shows weather");

    assert_eq!(file_names(ws.plugins_dir()), vec!["weather.json"]);
    assert_eq!(fs::read_to_string(ws.panels_dir().join("weather.html")).unwrap(), "weather weather.html");
    assert_eq!(fs::read_to_string(ws.assets_dir().join("weather.js")).unwrap(), "weather weather.js");
    assert!(ws.registry.read().is_loaded("weather"));

    let installed = ws.discovery().list_installed().unwrap();
    assert_eq!(installed.items.len(), 1);
    assert_eq!(installed.items[0].description, "shows weather");
}

#[test]
fn test_install_twice_is_rejected_without_changes() {
    let ws = Workspace::new();
    ws.add_plugin(&weather());
    let manager = ws.manager();
    manager.install("weather", None).unwrap();

    // Change the source so a second copy would be visible
    fs::write(ws.repository.local_path.join("weather").join("weather.js"), "changed").unwrap();
    let before = snapshot(&ws);

    let err = manager.install("weather", None).unwrap_err();
    assert!(matches!(err, PluginSystemError::AlreadyInstalled(ref name) if name == "weather"));
    assert_eq!(snapshot(&ws), before);
    assert_eq!(fs::read_to_string(ws.assets_dir().join("weather.js")).unwrap(), "weather weather.js");
}

#[test]
fn test_install_then_uninstall_restores_active_set() {
    let ws = Workspace::new();
    ws.add_plugin(&DescriptorBuilder::new("clock").description("tells time").build());
    ws.add_plugin(&weather());
    let manager = ws.manager();
    manager.install("clock", None).unwrap();
    let before = snapshot(&ws);

    manager.install("weather", None).unwrap();
    manager.uninstall("weather", false).unwrap();

    assert_eq!(snapshot(&ws), before);
    assert!(!ws.registry.read().is_loaded("weather"));
}

#[test]
fn test_install_defaults_to_first_repository() {
    let ws = Workspace::new();
    let second = ws.track_repository("second");
    ws.publish(&second, &DescriptorBuilder::new("radio").description("from second").build());

    let err = ws.manager().install("radio", None).unwrap_err();
    assert!(matches!(err, PluginSystemError::NotInRepository { ref repository, .. } if repository == "plugins-repo"));

    let descriptor = ws.manager().install("radio", Some(&second)).unwrap();
    assert_eq!(descriptor.description, "from second");
}

#[test]
fn test_install_without_any_repository() {
    let ws = Workspace::without_repository();
    let err = ws.manager().install("weather", None).unwrap_err();
    assert!(matches!(err, PluginSystemError::NoRepository));
}

#[test]
fn test_install_rejects_invalid_names() {
    let ws = Workspace::new();
    for name in ["", "../weather", "_private", "a/b"] {
        let err = ws.manager().install(name, None).unwrap_err();
        assert!(matches!(err, PluginSystemError::InvalidPluginName { .. }), "name {name:?}");
    }
    assert!(file_names(ws.plugins_dir()).is_empty());
}

#[test]
fn test_missing_asset_leaves_partial_install() {
    let ws = Workspace::new();
    ws.add_plugin(&weather());
    fs::remove_file(ws.repository.local_path.join("weather").join("weather.js")).unwrap();

    let err = ws.manager().install("weather", None).unwrap_err();
    match err {
        PluginSystemError::AssetCopy { plugin, asset, .. } => {
            assert_eq!(plugin, "weather");
            assert_eq!(asset, "weather.js");
        }
        other => panic!("unexpected error: {other}"),
    }
    // Nothing is rolled back
    assert!(ws.discovery().is_installed("weather"));
    assert_eq!(file_names(ws.panels_dir()), vec!["weather.html"]);
    assert!(file_names(ws.assets_dir()).is_empty());
}

#[test]
fn test_install_hook_runs_only_when_declared() {
    let ws = Workspace::new();
    let calls = CallLog::default();
    register_recording(&ws.registry, Namespace::Plugins, "weather", &calls, None, false);
    register_recording(&ws.registry, Namespace::Plugins, "clock", &calls, None, false);
    ws.add_plugin(&DescriptorBuilder::new("weather").description("w").hook(Hook::Install).build());
    ws.add_plugin(&DescriptorBuilder::new("clock").description("c").build());

    let manager = ws.manager();
    manager.install("weather", None).unwrap();
    manager.install("clock", None).unwrap();

    assert_eq!(*calls.lock().unwrap(), vec!["weather:on_install"]);
}

#[test]
fn test_install_hook_failure_keeps_copied_files() {
    let ws = Workspace::new();
    let calls = CallLog::default();
    register_recording(&ws.registry, Namespace::Plugins, "weather", &calls, Some(Hook::Install), false);
    ws.add_plugin(&DescriptorBuilder::new("weather").description("w").script("weather.js").hook(Hook::Install).build());

    let err = ws.manager().install("weather", None).unwrap_err();
    assert!(matches!(err, PluginSystemError::HookFailed { hook: Hook::Install, .. }));
    assert!(ws.discovery().is_installed("weather"));
    assert_eq!(file_names(ws.assets_dir()), vec!["weather.js"]);
}

#[test]
fn test_declared_hook_without_module() {
    let ws = Workspace::new();
    ws.add_plugin(&DescriptorBuilder::new("weather").description("w").hook(Hook::Install).build());
    let err = ws.manager().install("weather", None).unwrap_err();
    assert!(matches!(err, PluginSystemError::ModuleNotFound(_)));
}

#[test]
fn test_uninstall_not_installed() {
    let ws = Workspace::new();
    let err = ws.manager().uninstall("weather", false).unwrap_err();
    assert!(matches!(err, PluginSystemError::NotInstalled(ref name) if name == "weather"));
    let err = ws.manager().uninstall("weather", true).unwrap_err();
    assert!(matches!(err, PluginSystemError::NotInstalled(_)));
}

#[test]
fn test_uninstall_blocked_by_dependent_unless_forced() {
    let ws = Workspace::new();
    ws.add_plugin(&weather());
    ws.add_plugin(&DescriptorBuilder::new("commute").description("c").dependency("weather").build());
    let manager = ws.manager();
    manager.install("weather", None).unwrap();
    manager.install("commute", None).unwrap();
    let before = snapshot(&ws);

    assert!(!manager.check_dependents("weather").unwrap());
    assert_eq!(manager.dependents_of("weather").unwrap(), vec!["commute"]);
    let err = manager.uninstall("weather", false).unwrap_err();
    match err {
        PluginSystemError::DependencyBlocked { plugin, dependents } => {
            assert_eq!(plugin, "weather");
            assert_eq!(dependents, vec!["commute"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(snapshot(&ws), before);

    let report = manager.uninstall("weather", true).unwrap();
    assert_eq!(report.removed_assets, vec!["weather.html", "weather.js"]);
    assert!(!ws.discovery().is_installed("weather"));
    assert!(ws.discovery().is_installed("commute"));
}

#[test]
fn test_check_dependents_for_plugin_that_is_not_installed() {
    let ws = Workspace::new();
    ws.add_plugin(&DescriptorBuilder::new("commute").description("c").dependency("weather").build());
    let manager = ws.manager();
    assert!(manager.check_dependents("weather").unwrap());

    manager.install("commute", None).unwrap();
    assert!(!manager.check_dependents("weather").unwrap());
    assert!(manager.check_dependents("commute").unwrap());
}

#[test]
fn test_check_dependents_propagates_broken_descriptor() {
    let ws = Workspace::new();
    fs::write(ws.plugins_dir().join("broken.json"), "{").unwrap();
    let err = ws.manager().check_dependents("weather").unwrap_err();
    assert!(matches!(err, PluginSystemError::DescriptorLoad { .. }));
}

#[test]
fn test_uninstall_skips_assets_that_are_already_gone() {
    let ws = Workspace::new();
    ws.add_plugin(&weather());
    let manager = ws.manager();
    manager.install("weather", None).unwrap();
    fs::remove_file(ws.panels_dir().join("weather.html")).unwrap();

    let report = manager.uninstall("weather", false).unwrap();
    assert_eq!(report.missing_assets, vec!["weather.html"]);
    assert_eq!(report.removed_assets, vec!["weather.js"]);
    assert!(report.descriptor_loaded);
    assert!(!ws.discovery().is_installed("weather"));
}

#[test]
fn test_forced_uninstall_of_unreadable_descriptor_removes_unit() {
    let ws = Workspace::new();
    ws.add_plugin(&weather());
    let manager = ws.manager();
    manager.install("weather", None).unwrap();
    fs::write(ws.plugins_dir().join("weather.json"), "garbage").unwrap();

    let err = manager.uninstall("weather", false).unwrap_err();
    assert!(matches!(err, PluginSystemError::DescriptorLoad { .. }));
    assert!(ws.discovery().is_installed("weather"));

    let report = manager.uninstall("weather", true).unwrap();
    assert!(!report.descriptor_loaded);
    assert!(!ws.discovery().is_installed("weather"));
    // Assets could not be identified and stay behind
    assert_eq!(file_names(ws.assets_dir()), vec!["weather.js"]);
}

/// Records what was on disk when its uninstall hook ran
struct OrderWitness {
    unit: PathBuf,
    panel: PathBuf,
    seen: Arc<Mutex<Option<(bool, bool)>>>,
}

impl Plugin for OrderWitness {
    fn name(&self) -> &str {
        "weather"
    }

    fn run(&mut self) -> Result<Value, PluginError> {
        Ok(Value::Null)
    }

    fn on_uninstall(&mut self) -> Result<(), PluginError> {
        *self.seen.lock().unwrap() = Some((self.unit.exists(), self.panel.exists()));
        Ok(())
    }
}

#[test]
fn test_uninstall_hook_runs_after_assets_and_before_unit_removal() {
    let ws = Workspace::new();
    let seen = Arc::new(Mutex::new(None));
    let unit = ws.plugins_dir().join("weather.json");
    let panel = ws.panels_dir().join("weather.html");
    {
        let seen = Arc::clone(&seen);
        ws.registry
            .register(Namespace::Plugins, "weather", move |_, _| {
                Ok(Box::new(OrderWitness { unit: unit.clone(), panel: panel.clone(), seen: Arc::clone(&seen) }) as Box<dyn Plugin>)
            })
            .unwrap();
    }
    ws.add_plugin(&DescriptorBuilder::new("weather").description("w").panel("weather.html").hook(Hook::Uninstall).build());
    let manager = ws.manager();
    manager.install("weather", None).unwrap();
    manager.uninstall("weather", false).unwrap();

    assert_eq!(*seen.lock().unwrap(), Some((true, false)));
}

#[test]
fn test_uninstall_hook_failure_keeps_unit() {
    let ws = Workspace::new();
    let calls = CallLog::default();
    register_recording(&ws.registry, Namespace::Plugins, "weather", &calls, Some(Hook::Uninstall), false);
    ws.add_plugin(&DescriptorBuilder::new("weather").description("w").script("weather.js").hook(Hook::Uninstall).build());
    let manager = ws.manager();
    manager.install("weather", None).unwrap();

    let err = manager.uninstall("weather", false).unwrap_err();
    assert!(matches!(err, PluginSystemError::HookFailed { hook: Hook::Uninstall, .. }));
    assert!(ws.discovery().is_installed("weather"));
    assert!(file_names(ws.assets_dir()).is_empty());
}

#[test]
fn test_reinstall_picks_up_repository_changes() {
    let ws = Workspace::new();
    ws.add_plugin(&weather());
    ws.add_plugin(&DescriptorBuilder::new("commute").description("c").dependency("weather").build());
    let manager = ws.manager();
    manager.install("weather", None).unwrap();
    manager.install("commute", None).unwrap();

    let updated = DescriptorBuilder::new("weather").description("shows better weather").script("radar.js").build();
    fs::remove_dir_all(ws.repository.local_path.join("weather")).unwrap();
    ws.add_plugin(&updated);

    // Dependents do not block a reinstall
    let descriptor = manager.reinstall("weather", None).unwrap();
    assert_eq!(descriptor.description, "shows better weather");
    assert_eq!(file_names(ws.panels_dir()), Vec::<String>::new());
    assert_eq!(file_names(ws.assets_dir()), vec!["radar.js"]);
}

#[test]
fn test_reinstall_of_plugin_that_is_not_installed_installs_it() {
    let ws = Workspace::new();
    ws.add_plugin(&weather());
    ws.manager().reinstall("weather", None).unwrap();
    assert!(ws.discovery().is_installed("weather"));
}

#[test]
fn test_load_installed_rebuilds_loaded_set_from_disk() {
    let ws = Workspace::new();
    ws.add_plugin(&weather());
    ws.manager().install("weather", None).unwrap();
    fs::write(ws.plugins_dir().join("broken.json"), "{").unwrap();

    // A manager over a fresh registry knows nothing until it loads
    let fresh = PluginLifecycleManager::new(&ws.locations, ws.records.clone(), SharedPluginRegistry::default());
    assert!(!fresh.registry().read().is_loaded("weather"));

    let listing = fresh.load_installed().unwrap();
    assert_eq!(listing.items, vec!["weather"]);
    assert_eq!(listing.failures.len(), 1);
    assert!(fresh.registry().read().is_loaded("weather"));
}

#[test]
fn test_forced_uninstall_carries_on_past_failing_hook() {
    let ws = Workspace::new();
    let calls = CallLog::default();
    register_recording(&ws.registry, Namespace::Plugins, "weather", &calls, Some(Hook::Uninstall), false);
    ws.add_plugin(&DescriptorBuilder::new("weather").description("w").script("weather.js").hook(Hook::Uninstall).build());
    let manager = ws.manager();
    manager.install("weather", None).unwrap();

    let report = manager.uninstall("weather", true).unwrap();
    assert!(report.hook_error.as_deref().unwrap().contains("on_uninstall"));
    assert!(!ws.discovery().is_installed("weather"));
    assert!(!ws.registry.read().is_loaded("weather"));
    assert_eq!(*calls.lock().unwrap(), vec!["weather:on_uninstall"]);
}

#[test]
fn test_forced_uninstall_without_module_removes_unit() {
    let ws = Workspace::new();
    ws.add_plugin(&DescriptorBuilder::new("weather").description("w").hook(Hook::Uninstall).build());
    let manager = ws.manager();
    // Installing runs no hook, so no module is needed yet
    manager.install("weather", None).unwrap();

    let err = manager.uninstall("weather", false).unwrap_err();
    assert!(matches!(err, PluginSystemError::ModuleNotFound(_)));
    assert!(ws.discovery().is_installed("weather"));

    let report = manager.uninstall("weather", true).unwrap();
    assert!(report.hook_error.is_some());
    assert!(!ws.discovery().is_installed("weather"));
}
