//! Environment event bus.
//!
//! Publish/subscribe fan-out of `EnvEvent`s to every attached hook.

use tokio::sync::broadcast;
use tracing::trace;

use crate::types::EnvEvent;

pub const DEFAULT_BUS_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct EnvBus {
    sender: broadcast::Sender<EnvEvent>,
}

impl EnvBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { sender: tx }
    }

    /// Deliver `event` to all current subscribers. Returns how many there were;
    /// with nobody listening the event is dropped.
    pub fn publish(&self, event: EnvEvent) -> usize {
        trace!(kind = event.kind(), "Publishing environment event");
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EnvEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EnvBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_dropped() {
        let bus = EnvBus::new();
        assert_eq!(bus.publish(EnvEvent::VisibilityChange { visible: true }), 0);
    }

    #[tokio::test]
    async fn test_fan_out() {
        let bus = EnvBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.publish(EnvEvent::Unload { url: "/x".into() }), 2);
        assert_eq!(a.recv().await.unwrap().kind(), "unload");
        assert_eq!(b.recv().await.unwrap().kind(), "unload");
    }
}
