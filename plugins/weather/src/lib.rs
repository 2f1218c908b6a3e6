//! Example plugin shipped with the VectorCloud binary.
//!
//! Reports a canned forecast for the `city` option so a robot has something
//! to say. The forecast is derived from the city name alone, which keeps the
//! output stable across runs.
use serde_json::{json, Value};
use vectorcloud_core::plugin_system::error::PluginResult;
use vectorcloud_core::plugin_system::traits::target_device_id;
use vectorcloud_core::{Namespace, Plugin, PluginError, PluginOptions, SharedPluginRegistry};

/// Name the module is registered under
pub const PLUGIN_NAME: &str = "weather";

const CITY_OPTION: &str = "city";
const DEFAULT_CITY: &str = "San Francisco";
const CONDITIONS: [&str; 5] = ["sunny", "cloudy", "rainy", "windy", "foggy"];

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherPlugin {
    city: String,
    vector_id: String,
}

impl WeatherPlugin {
    pub fn from_options(options: &PluginOptions) -> Result<Self, PluginError> {
        let city = match options.get(CITY_OPTION) {
            None | Some(Value::Null) => DEFAULT_CITY.to_string(),
            Some(Value::String(city)) if !city.trim().is_empty() => city.trim().to_string(),
            Some(_) => {
                return Err(PluginError::InvalidOption {
                    key: CITY_OPTION.to_string(),
                    message: "expected a non-empty string".to_string(),
                });
            }
        };
        Ok(Self { city, vector_id: target_device_id(options) })
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    fn condition(&self) -> &'static str {
        let seed = self.city.to_lowercase().bytes().fold(0usize, |acc, b| acc.wrapping_add(b as usize));
        CONDITIONS[seed % CONDITIONS.len()]
    }
}

impl Plugin for WeatherPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn run(&mut self) -> Result<Value, PluginError> {
        let condition = self.condition();
        log::info!("Forecast for {}: {}", self.city, condition);
        Ok(json!({
            "city": self.city,
            "condition": condition,
            "forecast": format!("{} in {}", condition, self.city),
            "vector_id": self.vector_id,
        }))
    }

    fn on_install(&mut self) -> Result<(), PluginError> {
        log::info!("Weather plugin installed");
        Ok(())
    }

    fn on_startup(&mut self) -> Result<(), PluginError> {
        log::info!("Weather plugin ready, default city {}", DEFAULT_CITY);
        Ok(())
    }
}

/// Register the weather module in the primary namespace
pub fn register(registry: &SharedPluginRegistry) -> PluginResult<()> {
    registry.register(Namespace::Plugins, PLUGIN_NAME, |_name, options| {
        Ok(Box::new(WeatherPlugin::from_options(options)?) as Box<dyn Plugin>)
    })
}
