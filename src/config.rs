use crate::gateway::resilience::{BreakerConfig, RetryPolicy};
use std::time::Duration;

/// Gateway settings: provider endpoints plus the shared resilience policy.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub provider_a_endpoint: String,
    pub provider_b_endpoint: String,
    pub retry: RetryPolicy,
    pub breaker: BreakerConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider_a_endpoint: "http://localhost:8081/payments".to_string(),
            provider_b_endpoint: "http://localhost:8082/payments".to_string(),
            retry: RetryPolicy::default(),
            breaker: BreakerConfig::default(),
        }
    }
}

/// Outbox relay settings.
///
/// The lease must outlast the expected dispatch time: too short risks
/// duplicate dispatch (acceptable under at-least-once), too long delays
/// recovery from a crashed worker.
#[derive(Debug, Clone)]
pub struct OutboxConfig {
    pub enabled: bool,
    pub poll_interval: Duration,
    pub batch_size: usize,
    pub max_attempts: u32,
    pub lease_duration: Duration,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval: Duration::from_secs(5),
            batch_size: 10,
            max_attempts: 5,
            lease_duration: Duration::from_secs(300),
        }
    }
}
