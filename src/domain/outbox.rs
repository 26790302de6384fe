use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const AGGREGATE_PAYMENT: &str = "PAYMENT";

pub const EVENT_PAYMENT_PROCESSED: &str = "PAYMENT_PROCESSED";
pub const EVENT_PAYMENT_STATUS_CHANGED: &str = "PAYMENT_STATUS_CHANGED";

/// A staged event awaiting delivery through the outbox relay.
///
/// Created in the same logical unit of work as the state change it
/// describes, mutated only by the relay, never deleted. `processed` is
/// monotonic false→true; the lock flag plus expiry form a lease that at
/// most one worker holds at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: String,
    pub attempt_count: u32,
    pub processed: bool,
    pub locked: bool,
    pub lock_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OutboxEvent {
    pub fn new(
        aggregate_type: impl Into<String>,
        aggregate_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            aggregate_type: aggregate_type.into(),
            aggregate_id: aggregate_id.into(),
            event_type: event_type.into(),
            payload: payload.into(),
            attempt_count: 0,
            processed: false,
            locked: false,
            lock_expiry: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// An event is eligible for delivery when it is unprocessed and either
    /// unlocked or holding an expired lease.
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        !self.processed && (!self.locked || self.lock_expiry.is_some_and(|expiry| expiry < now))
    }
}
