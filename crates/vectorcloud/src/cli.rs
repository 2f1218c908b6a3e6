use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use vectorcloud_core::plugin_system::{AvailablePlugin, Listing, PluginDescriptor, UninstallReport};
use vectorcloud_core::{ChannelEvent, PluginOptions, Repository, StartupReport};

/// VectorCloud: plugin management for Vector robots
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Configuration file (json, toml or yaml)
    #[arg(long, global = true, conflicts_with = "base_dir")]
    pub config: Option<PathBuf>,

    /// Directory the default layout is rooted at
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage plugin repositories
    Repo {
        #[command(subcommand)]
        command: RepoCommand,
    },
    /// Manage plugins
    Plugin {
        #[command(subcommand)]
        command: PluginCommand,
    },
    /// Run the boot sequence once and print what it did
    Startup,
    /// Boot, then run the JSON `run_plugin` requests read from stdin, one per line
    Serve,
}

#[derive(Subcommand, Debug)]
pub enum RepoCommand {
    /// Clone a repository and track it
    Add {
        url: String,
        /// Pull and reinstall its plugins at every startup
        #[arg(long)]
        auto_update: bool,
    },
    /// Stop tracking a repository and delete its checkout
    Remove {
        /// Repository id or name
        key: String,
    },
    /// Pull one repository, or every tracked one
    Update {
        /// Repository id or name
        key: Option<String>,
    },
    /// List tracked repositories
    List,
    /// Turn auto-update on or off
    AutoUpdate {
        /// Repository id or name
        key: String,
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum PluginCommand {
    /// List the plugins a repository offers
    Available {
        /// Repository id or name; defaults to the first tracked repository
        #[arg(long)]
        repo: Option<String>,
    },
    /// List installed plugins
    List,
    /// Install a plugin
    Install {
        name: String,
        /// Repository id or name; defaults to the first tracked repository
        #[arg(long)]
        repo: Option<String>,
    },
    /// Uninstall a plugin
    Uninstall {
        name: String,
        /// Remove it even if other installed plugins depend on it
        #[arg(long)]
        force: bool,
    },
    /// Uninstall a plugin and install it again
    Reinstall {
        name: String,
        #[arg(long)]
        repo: Option<String>,
    },
    /// List installed plugins that depend on a plugin
    Dependents { name: String },
    /// Print the icons, panels and scripts of installed plugins as JSON
    Overview,
    /// Run a plugin and print the busy/free events around it
    Run {
        name: String,
        /// Plugin option as key=value; JSON values are decoded
        #[arg(long = "option", short = 'o', value_parser = parse_option)]
        options: Vec<(String, Value)>,
        /// Target device
        #[arg(long)]
        vector_id: Option<String>,
    },
}

/// Parse `key=value`, decoding the value as JSON when it is valid JSON
pub fn parse_option(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw.split_once('=').ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty option key in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

pub fn build_options(pairs: Vec<(String, Value)>, vector_id: Option<String>) -> PluginOptions {
    let mut options: PluginOptions = pairs.into_iter().collect();
    if let Some(id) = vector_id {
        options.insert("vector_id".to_string(), Value::String(id));
    }
    options
}

pub fn print_repositories(repositories: &[Repository]) {
    if repositories.is_empty() {
        println!("No repositories tracked.");
        return;
    }
    for repo in repositories {
        let auto = if repo.auto_update { "auto-update" } else { "manual" };
        println!("  [{}] {} ({}) {}", repo.id, repo.name, auto, repo.url);
    }
}

pub fn print_available(repository: &Repository, listing: &Listing<AvailablePlugin>) {
    println!("Plugins in '{}':", repository.name);
    if listing.items.is_empty() {
        println!("  No plugins found.");
    }
    for plugin in &listing.items {
        let marker = if plugin.installed { "*" } else { " " };
        println!("  {} {} - {}", marker, plugin.name, plugin.description);
    }
    print_failures(&listing.failures);
}

pub fn print_installed(listing: &Listing<PluginDescriptor>) {
    if listing.items.is_empty() && listing.failures.is_empty() {
        println!("No plugins installed.");
        return;
    }
    for descriptor in &listing.items {
        println!("  {} - {}", descriptor.name, descriptor.description);
        if !descriptor.dependencies.is_empty() {
            println!("      depends on: {}", descriptor.dependencies.join(", "));
        }
    }
    print_failures(&listing.failures);
}

pub fn print_uninstall_report(report: &UninstallReport) {
    println!("Uninstalled plugin '{}'.", report.plugin);
    for asset in &report.missing_assets {
        println!("  (asset '{}' was already gone)", asset);
    }
    if !report.descriptor_loaded {
        println!("  (descriptor was unreadable, only the unit was removed)");
    }
    if let Some(e) = &report.hook_error {
        println!("  (uninstall hook failed: {})", e);
    }
}

pub fn print_startup_report(report: &StartupReport) {
    println!("Devices: {}", report.devices);
    if let Some(e) = &report.device_error {
        println!("  device configuration ignored: {}", e);
    }
    for name in &report.updated_repositories {
        println!("Updated repository '{}'", name);
    }
    for (name, e) in &report.failed_repositories {
        println!("Repository '{}' failed: {}", name, e);
    }
    for name in &report.reinstalled {
        println!("Reinstalled plugin '{}'", name);
    }
    for name in &report.loaded {
        println!("Loaded plugin '{}'", name);
    }
    for name in &report.started {
        println!("Started plugin '{}'", name);
    }
    for (name, e) in &report.plugin_failures {
        println!("Plugin '{}' failed: {}", name, e);
    }
    println!("Startup complete{}.", if report.is_clean() { "" } else { " with errors" });
}

/// One event per line as `{"event": ..., "data": ...}`
pub fn print_event(event: &ChannelEvent) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{}", line),
        Err(e) => log::error!("Could not encode {:?}: {}", event, e),
    }
}

fn print_failures<E: std::fmt::Display>(failures: &[E]) {
    for failure in failures {
        println!("  ! {}", failure);
    }
}
