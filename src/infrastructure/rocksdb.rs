use crate::domain::outbox::OutboxEvent;
use crate::domain::payment::Payment;
use crate::domain::ports::{OutboxStore, PaymentStore};
use crate::error::{Result, RoutingError};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Column Family for payments.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family for outbox events.
pub const CF_OUTBOX: &str = "outbox_events";

/// A persistent store implementation using RocksDB.
///
/// Payments and outbox events live in separate Column Families with
/// serde_json values. Outbox mutations serialize through an in-process
/// mutex so the lease check-and-set stays atomic; this adapter is
/// single-process — cross-replica deployments need a store with native
/// conditional updates.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    outbox_write: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());
        let cf_outbox = ColumnFamilyDescriptor::new(CF_OUTBOX, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_payments, cf_outbox])?;

        Ok(Self {
            db: Arc::new(db),
            outbox_write: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| RoutingError::Storage(format!("column family not found: {name}")))
    }

    fn read_event(&self, id: Uuid) -> Result<Option<OutboxEvent>> {
        let cf = self.cf(CF_OUTBOX)?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_event(&self, event: &OutboxEvent) -> Result<()> {
        let cf = self.cf(CF_OUTBOX)?;
        self.db
            .put_cf(cf, event.id.as_bytes(), serde_json::to_vec(event)?)?;
        Ok(())
    }

    fn require_event(&self, id: Uuid) -> Result<OutboxEvent> {
        self.read_event(id)?
            .ok_or_else(|| RoutingError::Storage(format!("outbox event not found: {id}")))
    }
}

#[async_trait]
impl PaymentStore for RocksDbStore {
    async fn store(&self, payment: Payment) -> Result<()> {
        let cf = self.cf(CF_PAYMENTS)?;
        self.db
            .put_cf(cf, payment.id.as_bytes(), serde_json::to_vec(&payment)?)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payment>> {
        let cf = self.cf(CF_PAYMENTS)?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl OutboxStore for RocksDbStore {
    async fn append(&self, event: OutboxEvent) -> Result<()> {
        let _guard = self.outbox_write.lock().await;
        self.write_event(&event)
    }

    async fn fetch_unprocessed(&self, limit: usize) -> Result<Vec<OutboxEvent>> {
        let cf = self.cf(CF_OUTBOX)?;
        let now = Utc::now();
        let mut events = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) =
                item.map_err(|e| RoutingError::Storage(format!("iteration error: {e}")))?;
            let event: OutboxEvent = serde_json::from_slice(&value)?;
            if event.is_eligible(now) {
                events.push(event);
            }
        }
        events.sort_by_key(|event| event.created_at);
        events.truncate(limit);
        Ok(events)
    }

    async fn try_acquire_lease(&self, id: Uuid, lease: Duration) -> Result<bool> {
        let _guard = self.outbox_write.lock().await;
        let mut event = self.require_event(id)?;
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
        self.write_event(&event)?;
        Ok(true)
    }

    async fn mark_processed(&self, id: Uuid) -> Result<()> {
        let _guard = self.outbox_write.lock().await;
        let mut event = self.require_event(id)?;
        event.processed = true;
        event.locked = false;
        event.lock_expiry = None;
        event.updated_at = Utc::now();
        self.write_event(&event)
    }

    async fn record_attempt(&self, id: Uuid, attempt_count: u32) -> Result<()> {
        let _guard = self.outbox_write.lock().await;
        let mut event = self.require_event(id)?;
        event.attempt_count = attempt_count;
        event.updated_at = Utc::now();
        self.write_event(&event)
    }

    async fn release_lease(&self, id: Uuid) -> Result<()> {
        let _guard = self.outbox_write.lock().await;
        let mut event = self.require_event(id)?;
        event.locked = false;
        event.lock_expiry = None;
        event.updated_at = Utc::now();
        self.write_event(&event)
    }

    async fn get(&self, id: Uuid) -> Result<Option<OutboxEvent>> {
        self.read_event(id)
    }
}
