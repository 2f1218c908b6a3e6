#![cfg(test)]

use std::fs;

use crate::kernel::bootstrap::Application;
use crate::storage::config::AppConfig;

#[test]
fn test_application_from_config_file_with_relative_paths() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vectorcloud.toml");
    fs::write(
        &path,
        r#"
repositories_dir = "data/repos"
plugins_dir = "data/plugins"
run_timeout_secs = 30
channel_namespace = "/vectors"
"#,
    )
    .unwrap();

    let config = AppConfig::load(&path).unwrap();
    assert_eq!(config.repositories_dir, dir.path().join("data/repos"));
    assert_eq!(config.plugins_dir, dir.path().join("data/plugins"));
    assert_eq!(config.run_timeout_secs, Some(30));

    let app = Application::new(config).unwrap();
    app.initialize().unwrap();
    assert!(dir.path().join("data/repos").is_dir());
    assert!(dir.path().join("data/plugins").is_dir());
}
