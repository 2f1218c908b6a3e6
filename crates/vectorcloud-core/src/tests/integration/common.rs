#![cfg(test)]

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::kernel::bootstrap::Application;
use crate::plugin_system::descriptor::PluginDescriptor;
use crate::plugin_system::registry::Namespace;
use crate::plugin_system::traits::{Plugin, PluginError, PluginOptions};
use crate::repository::error::GitError;
use crate::repository::git::GitBackend;
use crate::storage::config::AppConfig;
use crate::storage::records::{JsonRecordStore, Repository};

// ===== MOCK GIT =====

/// Clones by copying a local fixture tree; pulls fail for chosen checkout names
#[derive(Debug, Default)]
pub struct FixtureGit {
    pub failing_pulls: HashSet<String>,
    pub pulls: Mutex<Vec<String>>,
}

#[async_trait]
impl GitBackend for FixtureGit {
    async fn clone_repository(&self, url: &str, dest: &Path) -> Result<(), GitError> {
        let source = PathBuf::from(url.trim_start_matches("file://"));
        if !source.is_dir() {
            return Err(GitError::Failed {
                command: format!("git clone {}", url),
                status: "exit status: 128".to_string(),
                stderr: format!("repository '{}' does not exist", url),
            });
        }
        copy_tree(&source, dest);
        Ok(())
    }

    async fn pull(&self, checkout: &Path) -> Result<(), GitError> {
        let name = checkout.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        self.pulls.lock().unwrap().push(name.clone());
        if self.failing_pulls.contains(&name) {
            return Err(GitError::Failed {
                command: "git pull".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "network unreachable".to_string(),
            });
        }
        Ok(())
    }
}

fn copy_tree(source: &Path, dest: &Path) {
    fs::create_dir_all(dest).unwrap();
    for entry in fs::read_dir(source).unwrap() {
        let entry = entry.unwrap();
        let target = dest.join(entry.file_name());
        if entry.path().is_dir() {
            copy_tree(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), target).unwrap();
        }
    }
}

// ===== MOCK PLUGINS =====

/// Reports the weather it was asked about, or fails when told to
pub struct WeatherPlugin {
    options: PluginOptions,
}

impl Plugin for WeatherPlugin {
    fn name(&self) -> &str {
        "weather"
    }

    fn run(&mut self) -> Result<Value, PluginError> {
        if self.options.get("fail").and_then(Value::as_bool).unwrap_or(false) {
            return Err(PluginError::ExecutionError("sensor offline".to_string()));
        }
        let city = self.options.get("city").and_then(Value::as_str).unwrap_or("nowhere");
        Ok(json!({"forecast": format!("sunny in {}", city)}))
    }
}

// ===== HARNESS =====

/// An application in a temp directory, plus a directory of upstream repositories to clone from
pub struct TestEnv {
    pub dir: TempDir,
    pub app: Application,
    pub git: Arc<FixtureGit>,
}

impl TestEnv {
    pub fn new(failing_pulls: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::with_base_dir(&dir.path().join("server"));
        let records = Arc::new(JsonRecordStore::open(&config.records_file).unwrap());
        let git = Arc::new(FixtureGit {
            failing_pulls: failing_pulls.iter().map(|s| s.to_string()).collect(),
            ..FixtureGit::default()
        });
        let app = Application::with_parts(config, records, git.clone());
        app.initialize().unwrap();
        app.registry()
            .register(Namespace::Plugins, "weather", |_, options| {
                Ok(Box::new(WeatherPlugin { options: options.clone() }) as Box<dyn Plugin>)
            })
            .unwrap();
        Self { dir, app, git }
    }

    /// Path of an upstream repository named `name`
    pub fn upstream(&self, name: &str) -> PathBuf {
        self.dir.path().join("upstream").join(format!("{}.git", name))
    }

    /// Write a plugin, with placeholder asset files, into upstream repository `repo`
    pub fn publish(&self, repo: &str, descriptor: &PluginDescriptor) {
        let dir = self.upstream(repo).join(&descriptor.name);
        fs::create_dir_all(&dir).unwrap();
        for asset in descriptor.panel_templates().chain(descriptor.scripts.iter().map(String::as_str)) {
            fs::write(dir.join(asset), format!("<!-- {} -->", asset)).unwrap();
        }
        fs::write(dir.join(format!("{}.json", descriptor.name)), descriptor.to_json().unwrap()).unwrap();
    }

    /// Clone upstream repository `repo` through the application
    pub async fn add_repository(&self, repo: &str) -> Repository {
        let url = format!("file://{}", self.upstream(repo).display());
        self.app.repositories().add(&url, false).await.unwrap()
    }

    pub fn installed_units(&self) -> Vec<String> {
        sorted_names(&self.app.config().plugins_dir)
    }

    pub fn active_panels(&self) -> Vec<String> {
        sorted_names(&self.app.config().panels_dir)
    }

    pub fn active_scripts(&self) -> Vec<String> {
        sorted_names(&self.app.config().assets_dir)
    }
}

pub fn sorted_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| entries.map(|e| e.unwrap().file_name().to_string_lossy().to_string()).collect())
        .unwrap_or_default();
    names.sort();
    names
}
