use crate::config::OutboxConfig;
use crate::domain::outbox::{EVENT_PAYMENT_PROCESSED, EVENT_PAYMENT_STATUS_CHANGED, OutboxEvent};
use crate::domain::ports::{SharedEventSink, SharedOutboxStore};
use crate::error::Result;
use tokio::time::MissedTickBehavior;

/// Periodic worker that leases, dispatches and retires outbox events.
///
/// Multiple relay instances may run across process replicas; the store's
/// conditional lease update is the only coordination between them. A single
/// instance never overlaps ticks.
pub struct OutboxRelay {
    store: SharedOutboxStore,
    sink: SharedEventSink,
    config: OutboxConfig,
}

impl OutboxRelay {
    pub fn new(store: SharedOutboxStore, sink: SharedEventSink, config: OutboxConfig) -> Self {
        Self {
            store,
            sink,
            config,
        }
    }

    /// Runs the relay on its fixed cadence until the task is dropped.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(err) = self.process_batch().await {
                tracing::error!(%err, "outbox batch processing failed");
            }
        }
    }

    /// One relay tick: fetch a bounded batch of eligible events oldest
    /// first, then lease, dispatch and retire each independently. Returns
    /// the number of events delivered.
    pub async fn process_batch(&self) -> Result<usize> {
        if !self.config.enabled {
            tracing::debug!("outbox processing is disabled");
            return Ok(0);
        }

        let events = self.store.fetch_unprocessed(self.config.batch_size).await?;
        if events.is_empty() {
            tracing::debug!("no outbox events to process");
            return Ok(0);
        }

        tracing::info!(count = events.len(), "processing outbox events");

        let mut delivered = 0;
        for event in events {
            if !self
                .store
                .try_acquire_lease(event.id, self.config.lease_duration)
                .await?
            {
                // Lost the race to another worker; not an error
                tracing::debug!(event_id = %event.id, "could not acquire lease, skipping");
                continue;
            }

            match self.dispatch(&event).await {
                Ok(()) => {
                    self.store.mark_processed(event.id).await?;
                    delivered += 1;
                    tracing::info!(event_id = %event.id, "outbox event delivered");
                }
                Err(err) => {
                    tracing::error!(event_id = %event.id, %err, "outbox event dispatch failed");
                    self.handle_failure(&event).await?;
                }
            }
            // Released on both branches; a crash mid-dispatch is recovered
            // by lease expiry instead
            self.store.release_lease(event.id).await?;
        }
        Ok(delivered)
    }

    async fn dispatch(&self, event: &OutboxEvent) -> Result<()> {
        match event.event_type.as_str() {
            EVENT_PAYMENT_PROCESSED | EVENT_PAYMENT_STATUS_CHANGED => {
                self.sink.publish(event).await
            }
            other => {
                tracing::warn!(event_id = %event.id, event_type = other, "unknown event type, dropping");
                Ok(())
            }
        }
    }

    async fn handle_failure(&self, event: &OutboxEvent) -> Result<()> {
        let attempt_count = event.attempt_count + 1;
        self.store.record_attempt(event.id, attempt_count).await?;
        if attempt_count >= self.config.max_attempts {
            // Dead-letter: no further delivery attempts, kept as an audit
            // record
            tracing::warn!(
                event_id = %event.id,
                attempt_count,
                "max delivery attempts reached, marking event processed without delivery"
            );
            self.store.mark_processed(event.id).await?;
        }
        Ok(())
    }
}
