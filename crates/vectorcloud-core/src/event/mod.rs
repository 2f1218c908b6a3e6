//! # VectorCloud Notification Events
//!
//! Busy/free status events, inbound run requests and the channel they travel
//! on. Delivery is best-effort: publishing never waits for subscribers and an
//! event with no listener is dropped.
pub mod channel;
pub mod error;
pub mod types;

use std::fmt;

/// Core event trait
pub trait Event: fmt::Debug + Send + Sync {
    /// Get the name of this event on the wire
    fn name(&self) -> &'static str;
}

pub use channel::{BroadcastChannel, NotificationChannel};
pub use error::EventSystemError;
pub use types::{ChannelEvent, RunRequest};
