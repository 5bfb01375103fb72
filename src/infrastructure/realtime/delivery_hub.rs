use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::application::ports::delivery_notifier::DeliveryNotifier;
use crate::domain::delivery::DeliveryEvent;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Fan-out point for delivery status events. One instance exists per process;
/// HTTP handlers publish into it and each socket connection holds a
/// [`DeliverySubscription`].
pub struct DeliverySocketHandler {
    events: broadcast::Sender<DeliveryEvent>,
    connections: Arc<AtomicUsize>,
}

impl DeliverySocketHandler {
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            events,
            connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn subscribe(&self) -> DeliverySubscription {
        self.connections.fetch_add(1, Ordering::SeqCst);
        DeliverySubscription {
            id: Uuid::new_v4(),
            rx: self.events.subscribe(),
            tracked: HashSet::new(),
            _guard: ConnectionGuard {
                connections: self.connections.clone(),
            },
        }
    }

    /// Number of live subscriptions.
    pub fn connected(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Default for DeliverySocketHandler {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

#[async_trait]
impl DeliveryNotifier for DeliverySocketHandler {
    async fn publish(&self, event: &DeliveryEvent) -> anyhow::Result<usize> {
        match self.events.send(event.clone()) {
            Ok(n) => Ok(n),
            // Nobody connected; the event is simply dropped.
            Err(broadcast::error::SendError(_)) => Ok(0),
        }
    }
}

struct ConnectionGuard {
    connections: Arc<AtomicUsize>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.connections.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A single client's view of the event stream, filtered to the orders it
/// tracks.
pub struct DeliverySubscription {
    id: Uuid,
    rx: broadcast::Receiver<DeliveryEvent>,
    tracked: HashSet<String>,
    _guard: ConnectionGuard,
}

impl DeliverySubscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn track(&mut self, order_id: &str) -> bool {
        self.tracked.insert(order_id.to_string())
    }

    pub fn untrack(&mut self, order_id: &str) -> bool {
        self.tracked.remove(order_id)
    }

    pub fn is_tracking(&self, order_id: &str) -> bool {
        self.tracked.contains(order_id)
    }

    /// Waits for the next event on a tracked order. Returns `None` once the
    /// handler is gone. Cancel-safe.
    pub async fn next(&mut self) -> Option<DeliveryEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.tracked.contains(&event.order_id) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(subscription = %self.id, skipped, "delivery_subscription_lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn publish_without_subscribers_is_not_an_error() {
        let hub = DeliverySocketHandler::default();
        let delivered = hub.publish(&DeliveryEvent::new("o-1", "preparing")).await.unwrap();
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn publish_counts_live_connections_not_trackers() {
        let hub = DeliverySocketHandler::default();
        let mut tracker = hub.subscribe();
        tracker.track("o-1");
        let _idle = hub.subscribe();
        let delivered = hub.publish(&DeliveryEvent::new("o-1", "preparing")).await.unwrap();
        assert_eq!(delivered, 2);
    }

    #[tokio::test]
    async fn tracked_order_events_are_delivered() {
        let hub = DeliverySocketHandler::default();
        let mut sub = hub.subscribe();
        assert!(sub.track("o-1"));
        assert!(!sub.track("o-1"));

        hub.publish(&DeliveryEvent::new("o-2", "preparing")).await.unwrap();
        hub.publish(&DeliveryEvent::new("o-1", "out_for_delivery")).await.unwrap();

        let ev = timeout(Duration::from_secs(1), sub.next()).await.unwrap().unwrap();
        assert_eq!(ev.order_id, "o-1");
        assert_eq!(ev.status, "out_for_delivery");
    }

    #[tokio::test]
    async fn untracked_orders_are_filtered() {
        let hub = DeliverySocketHandler::default();
        let mut sub = hub.subscribe();
        sub.track("o-1");
        assert!(sub.untrack("o-1"));
        assert!(!sub.is_tracking("o-1"));

        hub.publish(&DeliveryEvent::new("o-1", "delivered")).await.unwrap();
        assert!(timeout(Duration::from_millis(50), sub.next()).await.is_err());
    }

    #[tokio::test]
    async fn connection_count_follows_subscriptions() {
        let hub = DeliverySocketHandler::default();
        assert_eq!(hub.connected(), 0);
        let a = hub.subscribe();
        let b = hub.subscribe();
        assert_ne!(a.id(), b.id());
        assert_eq!(hub.connected(), 2);
        drop(a);
        assert_eq!(hub.connected(), 1);
        drop(b);
        assert_eq!(hub.connected(), 0);
    }

    #[tokio::test]
    async fn lagging_subscriber_recovers() {
        let hub = DeliverySocketHandler::new(2);
        let mut sub = hub.subscribe();
        sub.track("o-9");
        for i in 0..5 {
            hub.publish(&DeliveryEvent::new("o-9", format!("step-{i}")))
                .await
                .unwrap();
        }
        let ev = timeout(Duration::from_secs(1), sub.next()).await.unwrap().unwrap();
        assert_eq!(ev.status, "step-3");
    }
}
