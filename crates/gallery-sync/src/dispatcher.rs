use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::trace;

use gallery_types::events::SyncEvent;

/// Capacity of the change feed. Receivers that fall further behind see `Lagged`.
const CHANGE_FEED_CAPACITY: usize = 1024;

/// Fans committed changes out to live queries and gateway connections.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Every subscriber receives every change; filtering happens on the receiving side
    broadcast_tx: broadcast::Sender<SyncEvent>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            inner: Arc::new(DispatcherInner { broadcast_tx }),
        }
    }

    /// Subscribe to change events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Broadcast a change to all subscribers.
    pub fn broadcast(&self, event: SyncEvent) {
        // No receivers is not an error: nobody is watching yet
        let delivered = self.inner.broadcast_tx.send(event).unwrap_or(0);
        trace!("Change delivered to {} subscribers", delivered);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.broadcast_tx.receiver_count()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn every_subscriber_sees_each_change() {
        let dispatcher = Dispatcher::new();
        let mut a = dispatcher.subscribe();
        let mut b = dispatcher.subscribe();
        assert_eq!(dispatcher.subscriber_count(), 2);

        let event = SyncEvent::ReactionDelete { id: Uuid::nil(), image_id: "x".into() };
        dispatcher.broadcast(event.clone());

        assert_eq!(a.recv().await.unwrap(), event);
        assert_eq!(b.recv().await.unwrap(), event);
    }

    #[test]
    fn broadcast_without_subscribers_is_silent() {
        let dispatcher = Dispatcher::new();
        dispatcher.broadcast(SyncEvent::CommentDelete { id: Uuid::nil(), image_id: "x".into() });
        assert_eq!(dispatcher.subscriber_count(), 0);
    }
}
