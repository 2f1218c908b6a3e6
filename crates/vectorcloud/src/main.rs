mod cli;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc, oneshot};
use vectorcloud_core::kernel::error::{Error, Result};
use vectorcloud_core::{AppConfig, Application, ChannelEvent, Repository};

use cli::{CliArgs, Commands, PluginCommand, RepoCommand};

/// Inbound requests buffered between stdin and the runner
const REQUEST_QUEUE: usize = 32;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = CliArgs::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<()> {
    let config = match (&args.config, &args.base_dir) {
        (Some(path), _) => AppConfig::load(path)?,
        (None, Some(base)) => AppConfig::with_base_dir(base),
        (None, None) => AppConfig::with_base_dir(Path::new(".")),
    };
    let app = Application::new(config)?;
    app.initialize()?;

    // Plugins shipped with the binary
    weather_plugin::register(app.registry())?;

    match args.command {
        Commands::Repo { command } => repo_command(&app, command).await,
        Commands::Plugin { command } => plugin_command(&app, command).await,
        Commands::Startup => {
            let report = app.startup().await?;
            cli::print_startup_report(&report);
            Ok(())
        }
        Commands::Serve => serve(&app).await,
    }
}

async fn repo_command(app: &Application, command: RepoCommand) -> Result<()> {
    let repositories = app.repositories();
    match command {
        RepoCommand::Add { url, auto_update } => {
            let repo = repositories.add(&url, auto_update).await?;
            println!("Added repository '{}' as #{}.", repo.name, repo.id);
        }
        RepoCommand::Remove { key } => {
            let repo = repositories.find_by_key(&key)?;
            repositories.remove(&repo).await?;
            println!("Removed repository '{}'.", repo.name);
        }
        RepoCommand::Update { key } => {
            let target = key.as_deref().map(|key| repositories.find_by_key(key)).transpose()?;
            let outcomes = repositories.update(target.as_ref()).await?;
            if outcomes.is_empty() {
                println!("No repositories tracked.");
            }
            let mut failed = 0;
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(()) => println!("Updated '{}'.", outcome.repository.name),
                    Err(e) => {
                        failed += 1;
                        println!("Failed to update '{}': {}", outcome.repository.name, e);
                    }
                }
            }
            if failed > 0 {
                return Err(Error::Other(format!("{} of {} repositories failed to update", failed, outcomes.len())));
            }
        }
        RepoCommand::List => cli::print_repositories(&app.records().repositories()?),
        RepoCommand::AutoUpdate { key, enabled } => {
            let repo = repositories.find_by_key(&key)?;
            let repo = repositories.set_auto_update(&repo, enabled)?;
            println!("Auto-update for '{}' is {}.", repo.name, if repo.auto_update { "on" } else { "off" });
        }
    }
    Ok(())
}

async fn plugin_command(app: &Application, command: PluginCommand) -> Result<()> {
    let plugins = app.plugins();
    match command {
        PluginCommand::Available { repo } => {
            let repository = source_repository(app, repo.as_deref())?
                .ok_or_else(|| Error::Other("No repositories tracked.".to_string()))?;
            let listing = app.discovery().list_available(&repository)?;
            cli::print_available(&repository, &listing);
        }
        PluginCommand::List => cli::print_installed(&app.discovery().list_installed()?),
        PluginCommand::Install { name, repo } => {
            let repository = source_repository(app, repo.as_deref())?;
            let descriptor = plugins.install(&name, repository.as_ref())?;
            println!("Installed plugin '{}'.", descriptor.name);
        }
        PluginCommand::Uninstall { name, force } => {
            let report = plugins.uninstall(&name, force)?;
            cli::print_uninstall_report(&report);
        }
        PluginCommand::Reinstall { name, repo } => {
            let repository = source_repository(app, repo.as_deref())?;
            plugins.reinstall(&name, repository.as_ref())?;
            println!("Reinstalled plugin '{}'.", name);
        }
        PluginCommand::Dependents { name } => {
            let dependents = plugins.dependents_of(&name)?;
            if dependents.is_empty() {
                println!("No installed plugin depends on '{}'.", name);
            }
            for dependent in dependents {
                println!("  {}", dependent);
            }
        }
        PluginCommand::Overview => {
            let overview = app.discovery().overview()?;
            let text = serde_json::to_string_pretty(&overview)
                .map_err(|e| Error::Other(format!("could not encode overview: {}", e)))?;
            println!("{}", text);
        }
        PluginCommand::Run { name, options, vector_id } => {
            let mut events = app.channel().subscribe();
            let result = app.runner().run(&name, cli::build_options(options, vector_id)).await;
            drain_events(&mut events);
            let output = result?;
            println!("{}", output);
        }
    }
    Ok(())
}

/// Repository named by `key`, or the default install source when none is given
fn source_repository(app: &Application, key: Option<&str>) -> Result<Option<Repository>> {
    match key {
        Some(key) => Ok(Some(app.repositories().find_by_key(key)?)),
        None => Ok(app.records().first_repository()?),
    }
}

fn drain_events(events: &mut broadcast::Receiver<ChannelEvent>) {
    loop {
        match events.try_recv() {
            Ok(event) => cli::print_event(&event),
            Err(broadcast::error::TryRecvError::Lagged(missed)) => log::warn!("Missed {} event(s)", missed),
            Err(_) => break,
        }
    }
}

async fn serve(app: &Application) -> Result<()> {
    let report = app.startup().await?;
    cli::print_startup_report(&report);

    let mut events = app.channel().subscribe();
    let (done_tx, mut done_rx) = oneshot::channel::<()>();
    let printer = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                event = events.recv() => match event {
                    Ok(event) => cli::print_event(&event),
                    Err(broadcast::error::RecvError::Lagged(missed)) => log::warn!("Missed {} event(s)", missed),
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = &mut done_rx => {
                    drain_events(&mut events);
                    break;
                }
            }
        }
    });

    let (tx, rx) = mpsc::channel::<Value>(REQUEST_QUEUE);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match serde_json::from_str::<Value>(&line) {
                    Ok(payload) => {
                        if tx.send(payload).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => log::warn!("Ignoring malformed request line: {}", e),
                },
                Ok(None) => break,
                Err(e) => {
                    log::error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = app.serve(rx) => log::info!("Request stream closed"),
        _ = tokio::signal::ctrl_c() => log::info!("Interrupted, shutting down"),
    }

    let _ = done_tx.send(());
    printer.await.map_err(|e| Error::Other(format!("event printer failed: {}", e)))?;
    Ok(())
}
