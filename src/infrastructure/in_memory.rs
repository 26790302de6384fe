use crate::domain::outbox::OutboxEvent;
use crate::domain::payment::Payment;
use crate::domain::ports::{OutboxStore, PaymentStore};
use crate::error::{Result, RoutingError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory store for payments.
///
/// Uses `Arc<RwLock<HashMap>>` for shared concurrent access. Ideal for
/// testing or environments where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<Uuid, Payment>>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn store(&self, payment: Payment) -> Result<()> {
        let mut payments = self.payments.write().await;
        payments.insert(payment.id, payment);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(&id).cloned())
    }
}

#[derive(Default)]
struct OutboxInner {
    events: HashMap<Uuid, OutboxEvent>,
    // Insertion order == creation order; drives oldest-first fetches
    order: Vec<Uuid>,
}

/// A thread-safe in-memory outbox store.
///
/// The conditional lease update runs under a single write lock, which makes
/// it atomic with respect to every other caller of this store — the same
/// guarantee a conditional `UPDATE ... WHERE` gives across replicas.
#[derive(Default, Clone)]
pub struct InMemoryOutboxStore {
    inner: Arc<RwLock<OutboxInner>>,
}

impl InMemoryOutboxStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(id: Uuid) -> RoutingError {
    RoutingError::Storage(format!("outbox event not found: {id}"))
}

#[async_trait]
impl OutboxStore for InMemoryOutboxStore {
    async fn append(&self, event: OutboxEvent) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.order.push(event.id);
        inner.events.insert(event.id, event);
        Ok(())
    }

    async fn fetch_unprocessed(&self, limit: usize) -> Result<Vec<OutboxEvent>> {
        let inner = self.inner.read().await;
        let now = Utc::now();
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.events.get(id))
            .filter(|event| event.is_eligible(now))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn try_acquire_lease(&self, id: Uuid, lease: Duration) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let event = inner.events.get_mut(&id).ok_or_else(|| not_found(id))?;
        let now = Utc::now();
        if event.processed {
            return Ok(false);
        }
        if event.locked && event.lock_expiry.is_none_or(|expiry| expiry >= now) {
            return Ok(false);
        }
        event.locked = true;
        event.lock_expiry = Some(now + lease);
        event.updated_at = now;
        Ok(true)
    }

    async fn mark_processed(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        let event = inner.events.get_mut(&id).ok_or_else(|| not_found(id))?;
        event.processed = true;
        event.locked = false;
        event.lock_expiry = None;
        event.updated_at = Utc::now();
        Ok(())
    }

    async fn record_attempt(&self, id: Uuid, attempt_count: u32) -> Result<()> {
        let mut inner = self.inner.write().await;
        let event = inner.events.get_mut(&id).ok_or_else(|| not_found(id))?;
        event.attempt_count = attempt_count;
        event.updated_at = Utc::now();
        Ok(())
    }

    async fn release_lease(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().await;
        let event = inner.events.get_mut(&id).ok_or_else(|| not_found(id))?;
        event.locked = false;
        event.lock_expiry = None;
        event.updated_at = Utc::now();
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<OutboxEvent>> {
        let inner = self.inner.read().await;
        Ok(inner.events.get(&id).cloned())
    }
}
