use std::fmt::Debug;

use tokio::sync::broadcast;

use crate::event::Event;
use crate::event::types::ChannelEvent;

/// Outbound half of the notification channel.
///
/// Publishing is fire-and-forget: no acknowledgment and no backpressure.
pub trait NotificationChannel: Send + Sync + Debug {
    /// Namespace events are broadcast on
    fn namespace(&self) -> &str;

    /// Broadcast an event to every current subscriber
    fn publish(&self, event: ChannelEvent);
}

/// In-process channel over a tokio broadcast queue.
///
/// Subscribers that fall more than `capacity` events behind lose the oldest ones.
#[derive(Debug, Clone)]
pub struct BroadcastChannel {
    namespace: String,
    sender: broadcast::Sender<ChannelEvent>,
}

impl BroadcastChannel {
    pub fn new(namespace: &str, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { namespace: namespace.to_string(), sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl NotificationChannel for BroadcastChannel {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn publish(&self, event: ChannelEvent) {
        log::debug!("{} {} on '{}'", event.name(), event.device_id(), self.namespace);
        if self.sender.send(event).is_err() {
            log::trace!("No subscribers on '{}'", self.namespace);
        }
    }
}
