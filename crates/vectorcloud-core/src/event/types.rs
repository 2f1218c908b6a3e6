use serde::Serialize;
use serde_json::Value;

use crate::event::Event;
use crate::event::error::EventSystemError;
use crate::plugin_system::traits::{target_device_id, PluginOptions};

/// Name of the inbound event that asks for a plugin run
pub const RUN_PLUGIN_EVENT: &str = "run_plugin";

/// Outbound status events, tagged with the target device id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ChannelEvent {
    /// A plugin started running against the device
    VectorBusy(String),
    /// The run finished, successfully or not
    VectorFree(String),
}

impl ChannelEvent {
    pub fn device_id(&self) -> &str {
        match self {
            ChannelEvent::VectorBusy(id) | ChannelEvent::VectorFree(id) => id,
        }
    }
}

impl Event for ChannelEvent {
    fn name(&self) -> &'static str {
        match self {
            ChannelEvent::VectorBusy(_) => "vector_busy",
            ChannelEvent::VectorFree(_) => "vector_free",
        }
    }
}

/// Inbound `run_plugin` request
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub name: String,
    /// Every payload key except `name`
    pub options: PluginOptions,
}

impl RunRequest {
    pub fn new(name: &str, options: PluginOptions) -> Self {
        Self { name: name.to_string(), options }
    }

    /// Decode a `run_plugin` payload: an object with a string `name`
    pub fn from_payload(payload: Value) -> Result<Self, EventSystemError> {
        let invalid = |details: &str| EventSystemError::InvalidEventData {
            event_name: RUN_PLUGIN_EVENT.to_string(),
            details: details.to_string(),
        };
        let Value::Object(mut options) = payload else {
            return Err(invalid("payload is not an object"));
        };
        let name = match options.remove("name") {
            Some(Value::String(name)) if !name.is_empty() => name,
            Some(_) => return Err(invalid("'name' must be a non-empty string")),
            None => return Err(invalid("missing 'name'")),
        };
        Ok(Self { name, options })
    }

    /// Device the run targets, empty if none was given
    pub fn device_id(&self) -> String {
        target_device_id(&self.options)
    }
}

impl Event for RunRequest {
    fn name(&self) -> &'static str {
        RUN_PLUGIN_EVENT
    }
}
