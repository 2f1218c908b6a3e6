/// Application name
pub const APP_NAME: &str = "VectorCloud";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default repositories directory
pub const REPOSITORIES_DIR: &str = "repositories";

/// Default active plugins directory
pub const PLUGINS_DIR: &str = "plugins";

/// Default active panel templates directory
pub const PANELS_DIR: &str = "templates/plugins";

/// Default active script assets directory
pub const ASSETS_DIR: &str = "static/js/plugins";

/// Default record store file
pub const RECORDS_FILE: &str = "records.json";

/// Default device configuration file
pub const DEVICE_CONFIG_FILE: &str = "sdk_config.ini";

/// Extension of a plugin unit file
pub const PLUGIN_UNIT_EXTENSION: &str = "json";

/// Source-control suffix stripped from repository names
pub const REPOSITORY_URL_SUFFIX: &str = ".git";

/// Option key carrying the target device of a run
pub const VECTOR_ID_OPTION: &str = "vector_id";

/// Default namespace busy/free events are broadcast on
pub const DEFAULT_CHANNEL_NAMESPACE: &str = "/";

/// Default broadcast buffer per subscriber
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
