#![cfg(test)]

use crate::plugin_system::descriptor::DescriptorBuilder;
use crate::plugin_system::error::PluginSystemError;
use crate::tests::integration::common::TestEnv;

fn weather() -> crate::plugin_system::descriptor::PluginDescriptor {
    DescriptorBuilder::new("weather")
        .description("shows weather")
        .panel("weather.html")
        .script("weather.js")
        .build()
}

#[tokio::test]
async fn test_install_from_cloned_repository() {
    let env = TestEnv::new(&[]);
    env.publish("robot-plugins", &weather());
    let repository = env.add_repository("robot-plugins").await;

    let available = env.app.discovery().list_available(&repository).unwrap();
    assert_eq!(available.items.len(), 1);
    assert!(!available.items[0].installed);

    env.app.plugins().install("weather", None).unwrap();

    assert_eq!(env.installed_units(), vec!["weather.json"]);
    assert_eq!(env.active_panels(), vec!["weather.html"]);
    assert_eq!(env.active_scripts(), vec!["weather.js"]);
    let installed = env.app.discovery().list_installed().unwrap();
    assert!(installed.items.iter().any(|d| d.name == "weather" && d.description == "shows weather"));
    assert!(env.app.discovery().list_available(&repository).unwrap().items[0].installed);
}

#[tokio::test]
async fn test_round_trip_restores_active_set() {
    let env = TestEnv::new(&[]);
    env.publish("robot-plugins", &weather());
    env.publish("robot-plugins", &DescriptorBuilder::new("clock").description("tells time").script("clock.js").build());
    env.add_repository("robot-plugins").await;
    let plugins = env.app.plugins();
    plugins.install("clock", None).unwrap();

    let before = (env.installed_units(), env.active_panels(), env.active_scripts());
    plugins.install("weather", None).unwrap();
    plugins.uninstall("weather", false).unwrap();
    assert_eq!((env.installed_units(), env.active_panels(), env.active_scripts()), before);
}

#[tokio::test]
async fn test_second_install_changes_nothing() {
    let env = TestEnv::new(&[]);
    env.publish("robot-plugins", &weather());
    env.add_repository("robot-plugins").await;
    env.app.plugins().install("weather", None).unwrap();
    let before = (env.installed_units(), env.active_panels(), env.active_scripts());

    let err = env.app.plugins().install("weather", None).unwrap_err();
    assert!(matches!(err, PluginSystemError::AlreadyInstalled(_)));
    assert_eq!((env.installed_units(), env.active_panels(), env.active_scripts()), before);
}

#[tokio::test]
async fn test_dependency_blocks_uninstall_until_forced() {
    let env = TestEnv::new(&[]);
    env.publish("robot-plugins", &weather());
    env.publish("robot-plugins", &DescriptorBuilder::new("commute").description("c").dependency("weather").build());
    env.add_repository("robot-plugins").await;
    let plugins = env.app.plugins();

    // Nothing installed depends on weather yet, installed or not
    assert!(plugins.check_dependents("weather").unwrap());
    plugins.install("weather", None).unwrap();
    plugins.install("commute", None).unwrap();
    assert!(!plugins.check_dependents("weather").unwrap());
    assert!(plugins.check_dependents("commute").unwrap());

    let err = plugins.uninstall("weather", false).unwrap_err();
    assert!(matches!(err, PluginSystemError::DependencyBlocked { ref dependents, .. } if dependents == &["commute"]));
    assert!(env.app.discovery().is_installed("weather"));

    plugins.uninstall("weather", true).unwrap();
    assert!(!env.app.discovery().is_installed("weather"));

    // With its dependency gone the dependent can still be removed normally
    plugins.uninstall("commute", false).unwrap();
    assert!(env.installed_units().is_empty());
}

#[tokio::test]
async fn test_reinstall_after_repository_update() {
    let env = TestEnv::new(&[]);
    env.publish("robot-plugins", &weather());
    let repository = env.add_repository("robot-plugins").await;
    env.app.plugins().install("weather", None).unwrap();

    // Simulate what a pull would bring into the checkout
    let unit = repository.local_path.join("weather").join("weather.json");
    let updated = DescriptorBuilder::new("weather")
        .description("shows weather, now with radar")
        .panel("weather.html")
        .script("weather.js")
        .build();
    std::fs::write(unit, updated.to_json().unwrap()).unwrap();

    let outcomes = env.app.repositories().update(Some(&repository)).await.unwrap();
    assert!(outcomes[0].is_success());
    let descriptor = env.app.plugins().reinstall("weather", Some(&repository)).unwrap();
    assert_eq!(descriptor.description, "shows weather, now with radar");
}
