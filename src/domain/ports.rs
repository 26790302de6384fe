use super::outbox::OutboxEvent;
use super::payment::Payment;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub type SharedPaymentStore = Arc<dyn PaymentStore>;
pub type SharedOutboxStore = Arc<dyn OutboxStore>;
pub type SharedEventSink = Arc<dyn EventSink>;

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn store(&self, payment: Payment) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Payment>>;
}

/// Durable staging area for outbox events.
///
/// `try_acquire_lease` must be an atomic conditional update: it succeeds iff
/// the event is unlocked or its lease has expired, and no two concurrent
/// callers may both succeed on the same event.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    async fn append(&self, event: OutboxEvent) -> Result<()>;

    /// Returns up to `limit` eligible events, oldest first.
    async fn fetch_unprocessed(&self, limit: usize) -> Result<Vec<OutboxEvent>>;

    /// Attempts to claim the event for `lease` from now. Returns `false`
    /// when another worker holds a live lease (lost race, silent skip).
    async fn try_acquire_lease(&self, id: Uuid, lease: Duration) -> Result<bool>;

    /// Marks the event processed and clears any lease. Monotonic: never
    /// reset back to unprocessed.
    async fn mark_processed(&self, id: Uuid) -> Result<()>;

    async fn record_attempt(&self, id: Uuid, attempt_count: u32) -> Result<()>;

    /// Clears the lease; a no-op when the event is not locked.
    async fn release_lease(&self, id: Uuid) -> Result<()>;

    async fn get(&self, id: Uuid) -> Result<Option<OutboxEvent>>;
}

/// External event bus/log collaborator the relay publishes into.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: &OutboxEvent) -> Result<()>;
}
