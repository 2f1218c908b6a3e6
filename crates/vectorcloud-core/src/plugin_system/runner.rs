use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::event::channel::NotificationChannel;
use crate::event::types::{ChannelEvent, RunRequest};
use crate::plugin_system::error::{PluginResult, PluginSystemError};
use crate::plugin_system::loader::PluginDiscovery;
use crate::plugin_system::registry::SharedPluginRegistry;
use crate::plugin_system::traits::{target_device_id, PluginOptions};

/// Marks a device busy for as long as it lives.
///
/// Publishes `vector_busy` on creation and `vector_free` when dropped, so the
/// free event follows on every exit path, including errors and panics.
#[derive(Debug)]
pub struct BusyGuard {
    channel: Arc<dyn NotificationChannel>,
    device_id: String,
}

impl BusyGuard {
    pub fn acquire(channel: Arc<dyn NotificationChannel>, device_id: String) -> Self {
        channel.publish(ChannelEvent::VectorBusy(device_id.clone()));
        Self { channel, device_id }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.channel.publish(ChannelEvent::VectorFree(std::mem::take(&mut self.device_id)));
    }
}

/// Executes plugins by name and announces busy/free around each run.
#[derive(Debug, Clone)]
pub struct PluginRunner {
    discovery: PluginDiscovery,
    registry: SharedPluginRegistry,
    channel: Arc<dyn NotificationChannel>,
    timeout: Option<Duration>,
}

impl PluginRunner {
    pub fn new(discovery: PluginDiscovery, registry: SharedPluginRegistry, channel: Arc<dyn NotificationChannel>) -> Self {
        Self { discovery, registry, channel, timeout: None }
    }

    /// Bound every run by `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn channel(&self) -> &Arc<dyn NotificationChannel> {
        &self.channel
    }

    /// Resolve, build and run `name` on the current thread, without events
    pub fn execute(&self, name: &str, options: &PluginOptions) -> PluginResult<Value> {
        let factory = self.registry.resolve(name, self.discovery.is_installed(name))?;
        let failed = |source| PluginSystemError::ExecutionFailed { plugin: name.to_string(), source };
        let mut plugin = factory(name, options).map_err(failed)?;
        plugin.run().map_err(failed)
    }

    /// Run `name` on the current thread between busy and free events
    pub fn run_blocking(&self, name: &str, options: &PluginOptions) -> PluginResult<Value> {
        let _guard = BusyGuard::acquire(Arc::clone(&self.channel), target_device_id(options));
        self.execute(name, options)
    }

    /// Run `name` on the blocking pool between busy and free events.
    ///
    /// A panicking plugin is reported as [`PluginSystemError::Panicked`]. On
    /// timeout the free event is published immediately; the plugin thread
    /// cannot be interrupted and is left to finish on its own.
    pub async fn run(&self, name: &str, options: PluginOptions) -> PluginResult<Value> {
        let _guard = BusyGuard::acquire(Arc::clone(&self.channel), target_device_id(&options));
        log::info!("Running plugin '{}'", name);

        let runner = self.clone();
        let plugin = name.to_string();
        let task = tokio::task::spawn_blocking(move || runner.execute(&plugin, &options));

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    log::warn!("Plugin '{}' exceeded its {:?} deadline", name, limit);
                    return Err(PluginSystemError::Timeout { plugin: name.to_string(), limit });
                }
            },
            None => task.await,
        };

        match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(PluginSystemError::Panicked {
                plugin: name.to_string(),
                message: panic_message(e.into_panic()),
            }),
            Err(e) => Err(PluginSystemError::Panicked { plugin: name.to_string(), message: e.to_string() }),
        }
    }

    /// Run a decoded request
    pub async fn handle(&self, request: RunRequest) -> PluginResult<Value> {
        self.run(&request.name, request.options).await
    }

    /// Serve inbound `run_plugin` payloads until the sender side closes.
    ///
    /// Requests run concurrently; malformed payloads are logged and dropped.
    /// Returns once every in-flight run has finished.
    pub async fn serve(self, mut requests: mpsc::Receiver<Value>) {
        let mut in_flight = JoinSet::new();
        while let Some(payload) = requests.recv().await {
            let request = match RunRequest::from_payload(payload) {
                Ok(request) => request,
                Err(e) => {
                    log::warn!("Ignoring run request: {}", e);
                    continue;
                }
            };
            let runner = self.clone();
            in_flight.spawn(async move {
                let name = request.name.clone();
                match runner.handle(request).await {
                    Ok(output) => log::info!("Plugin '{}' finished: {}", name, output),
                    Err(e) => log::error!("{}", e),
                }
            });
            // Reap finished runs so the set does not grow without bound
            while in_flight.try_join_next().is_some() {}
        }
        while in_flight.join_next().await.is_some() {}
        log::debug!("Run request stream closed");
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
