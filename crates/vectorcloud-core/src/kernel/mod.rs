//! # VectorCloud Kernel
//!
//! Wires the subsystems together and runs the boot sequence.
//!
//! ## Key Responsibilities & Components:
//!
//! - **Application Wiring**: [`Application`](bootstrap::Application) builds the
//!   record store, locations, registry, channel, repository sync, lifecycle
//!   manager and runner from an [`AppConfig`](crate::storage::config::AppConfig).
//! - **Startup**: [`StartupCoordinator`](startup::StartupCoordinator) reseeds
//!   devices, auto-updates repositories, reinstalls their installed plugins and
//!   calls startup hooks.
//! - **Core Constants**: default locations, file names and channel settings.
//! - **Error Handling**: the aggregate [`Error`](error::Error) and `Result` alias.
pub mod bootstrap;
pub mod constants;
pub mod error;
pub mod startup;

pub use bootstrap::Application;
pub use error::{Error, Result};
pub use startup::{StartupCoordinator, StartupReport};
