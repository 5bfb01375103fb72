use async_trait::async_trait;

use crate::domain::delivery::DeliveryEvent;

#[async_trait]
pub trait DeliveryNotifier: Send + Sync {
    /// Hands an event to every live socket connection; each connection
    /// forwards it only if it tracks the event's order. Returns the number of
    /// live connections, tracking or not. Zero is not an error.
    async fn publish(&self, event: &DeliveryEvent) -> anyhow::Result<usize>;
}
