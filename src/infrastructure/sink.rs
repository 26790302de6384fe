use crate::domain::outbox::OutboxEvent;
use crate::domain::ports::EventSink;
use crate::error::Result;
use async_trait::async_trait;

/// Event sink that publishes by logging. Stands in for a message broker
/// in local runs and demos.
#[derive(Default, Clone)]
pub struct LoggingEventSink;

impl LoggingEventSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn publish(&self, event: &OutboxEvent) -> Result<()> {
        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            aggregate_type = %event.aggregate_type,
            aggregate_id = %event.aggregate_id,
            "publishing event"
        );
        Ok(())
    }
}
