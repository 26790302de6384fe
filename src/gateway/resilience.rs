use super::transport::ProviderTransport;
use super::{ProviderRequest, ProviderResponse};
use crate::domain::payment::ProviderId;
use crate::error::{Result, RoutingError};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{Instant, sleep};

/// Backoff schedule for transient provider failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1000),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry with the given zero-based index.
    pub fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff * self.multiplier.pow(retry)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Failure rate over the window that trips the circuit.
    pub failure_rate_threshold: f64,
    /// Outcomes required in the window before the rate is considered.
    pub minimum_requests: usize,
    /// Bounded rolling window of call outcomes.
    pub window_size: usize,
    /// Time the circuit stays open before allowing a probe.
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 0.5,
            minimum_requests: 5,
            window_size: 20,
            cooldown: Duration::from_secs(30),
        }
    }
}

struct BreakerInner {
    state: CircuitState,
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

/// Call-guarding state machine. Transitions are driven purely by observed
/// call outcomes: CLOSED trips to OPEN when the failure rate over the
/// rolling window crosses the threshold, OPEN admits a single HALF_OPEN
/// probe after the cooldown, and the probe outcome closes or reopens the
/// circuit.
#[derive(Clone)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Arc<RwLock<BreakerInner>>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: Arc::new(RwLock::new(BreakerInner {
                state: CircuitState::Closed,
                window: VecDeque::new(),
                opened_at: None,
                probe_in_flight: false,
            })),
        }
    }

    /// Whether a call may proceed. Claims the probe slot when the cooldown
    /// has elapsed in OPEN.
    pub async fn try_acquire(&self) -> bool {
        let mut inner = self.inner.write().await;
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let cooled_down = inner
                    .opened_at
                    .is_some_and(|at| at.elapsed() >= self.config.cooldown);
                if cooled_down {
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_in_flight = true;
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    false
                } else {
                    inner.probe_in_flight = true;
                    true
                }
            }
        }
    }

    pub async fn record_success(&self) {
        let mut inner = self.inner.write().await;
        if inner.state == CircuitState::HalfOpen {
            tracing::info!("probe succeeded, closing circuit");
            inner.state = CircuitState::Closed;
            inner.window.clear();
            inner.opened_at = None;
            inner.probe_in_flight = false;
        } else {
            Self::push_outcome(&mut inner, &self.config, true);
        }
    }

    pub async fn record_failure(&self) {
        let mut inner = self.inner.write().await;
        match inner.state {
            CircuitState::HalfOpen => {
                tracing::warn!("probe failed, reopening circuit");
                Self::open(&mut inner);
            }
            CircuitState::Closed => {
                Self::push_outcome(&mut inner, &self.config, false);
                if Self::should_trip(&inner, &self.config) {
                    tracing::warn!("failure rate threshold exceeded, opening circuit");
                    Self::open(&mut inner);
                }
            }
            CircuitState::Open => {}
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.inner.read().await.state
    }

    fn push_outcome(inner: &mut BreakerInner, config: &BreakerConfig, success: bool) {
        inner.window.push_back(success);
        while inner.window.len() > config.window_size {
            inner.window.pop_front();
        }
    }

    fn should_trip(inner: &BreakerInner, config: &BreakerConfig) -> bool {
        let total = inner.window.len();
        if total < config.minimum_requests {
            return false;
        }
        let failures = inner.window.iter().filter(|success| !**success).count();
        (failures as f64) / (total as f64) >= config.failure_rate_threshold
    }

    fn open(inner: &mut BreakerInner) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        inner.probe_in_flight = false;
    }
}

/// Wraps a transport call with the retry policy and circuit breaker, and
/// converts client rejections into synthesized terminal responses.
pub struct ResilientClient {
    transport: Arc<dyn ProviderTransport>,
    retry: RetryPolicy,
    breaker: CircuitBreaker,
}

impl ResilientClient {
    pub fn new(
        transport: Arc<dyn ProviderTransport>,
        retry: RetryPolicy,
        breaker: CircuitBreaker,
    ) -> Self {
        Self {
            transport,
            retry,
            breaker,
        }
    }

    pub async fn execute(
        &self,
        provider: ProviderId,
        endpoint: &str,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse> {
        let mut attempts = 0;
        loop {
            if !self.breaker.try_acquire().await {
                return Err(RoutingError::CircuitOpen(provider));
            }

            match self.transport.send(endpoint, request).await {
                Ok(response) => {
                    self.breaker.record_success().await;
                    return Ok(response);
                }
                Err(err) if err.is_client_rejection() => {
                    // An authoritative answer, not a transport fault
                    self.breaker.record_success().await;
                    tracing::warn!(
                        %provider,
                        payment_id = %request.payment_id,
                        %err,
                        "provider rejected payment, synthesizing failed response"
                    );
                    return Ok(ProviderResponse::rejected(request.payment_id));
                }
                Err(err) if err.is_transient() => {
                    self.breaker.record_failure().await;
                    attempts += 1;
                    if attempts >= self.retry.max_attempts {
                        return Err(RoutingError::Provider(format!(
                            "{provider} unavailable after {attempts} attempts: {err}"
                        )));
                    }
                    let delay = self.retry.backoff(attempts - 1);
                    tracing::debug!(
                        %provider,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        "transient provider failure, backing off"
                    );
                    sleep(delay).await;
                }
                Err(err) => {
                    self.breaker.record_failure().await;
                    return Err(RoutingError::Provider(err.to_string()));
                }
            }
        }
    }
}
