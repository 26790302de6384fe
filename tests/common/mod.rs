#![allow(dead_code)]

use async_trait::async_trait;
use payrouter::config::GatewayConfig;
use payrouter::domain::outbox::OutboxEvent;
use payrouter::domain::payment::PaymentStatus;
use payrouter::domain::ports::EventSink;
use payrouter::error::{Result, RoutingError};
use payrouter::gateway::transport::{ProviderTransport, TransportError};
use payrouter::gateway::{ProviderRequest, ProviderResponse};
use payrouter::gateway::resilience::RetryPolicy;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Gateway config with millisecond backoffs so retry tests run fast.
pub fn fast_gateway_config() -> GatewayConfig {
    GatewayConfig {
        retry: RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            multiplier: 2,
        },
        ..GatewayConfig::default()
    }
}

/// Transport replaying a scripted sequence of outcomes; once exhausted it
/// answers with a completed payment.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<std::result::Result<ProviderResponse, TransportError>>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(outcomes: Vec<std::result::Result<ProviderResponse, TransportError>>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderTransport for ScriptedTransport {
    async fn send(
        &self,
        _endpoint: &str,
        request: &ProviderRequest,
    ) -> std::result::Result<ProviderResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().expect("script lock").pop_front() {
            Some(outcome) => outcome,
            None => Ok(ProviderResponse {
                payment_id: request.payment_id,
                provider_reference: "REF_OK".to_string(),
                status: PaymentStatus::Completed,
            }),
        }
    }
}

/// Sink that records every published event.
#[derive(Default)]
pub struct RecordingSink {
    published: Mutex<Vec<OutboxEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<OutboxEvent> {
        self.published.lock().expect("published lock").clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn publish(&self, event: &OutboxEvent) -> Result<()> {
        self.published
            .lock()
            .expect("published lock")
            .push(event.clone());
        Ok(())
    }
}

/// Sink that fails the first `failures` publishes, then succeeds and
/// records.
pub struct FlakySink {
    remaining_failures: Mutex<u32>,
    recorder: RecordingSink,
}

impl FlakySink {
    pub fn failing(failures: u32) -> Self {
        Self {
            remaining_failures: Mutex::new(failures),
            recorder: RecordingSink::new(),
        }
    }

    pub fn published(&self) -> Vec<OutboxEvent> {
        self.recorder.published()
    }
}

#[async_trait]
impl EventSink for FlakySink {
    async fn publish(&self, event: &OutboxEvent) -> Result<()> {
        {
            let mut remaining = self.remaining_failures.lock().expect("failure counter");
            if *remaining > 0 {
                *remaining -= 1;
                return Err(RoutingError::Provider("event bus unavailable".to_string()));
            }
        }
        self.recorder.publish(event).await
    }
}
