//! Provider invocation gateway: per-provider request shaping behind a
//! shared resilience policy (retry + circuit breaker).

pub mod resilience;
pub mod transport;

use crate::config::GatewayConfig;
use crate::domain::payment::{Payment, PaymentStatus, ProviderId};
use crate::error::{Result, RoutingError};
use chrono::Utc;
use resilience::{CircuitBreaker, ResilientClient};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use transport::ProviderTransport;
use uuid::Uuid;

/// Canonical payment payload sent to a provider, before provider-specific
/// shaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRequest {
    pub payment_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub card_number: String,
    pub bin: String,
}

impl From<&Payment> for ProviderRequest {
    fn from(payment: &Payment) -> Self {
        Self {
            payment_id: payment.id,
            amount: payment.amount,
            currency: payment.currency.clone(),
            card_number: payment.card_number.clone(),
            bin: payment.bin.clone(),
        }
    }
}

/// Canonical provider response returned to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse {
    pub payment_id: Uuid,
    pub provider_reference: String,
    pub status: PaymentStatus,
}

impl ProviderResponse {
    /// Synthesized terminal response for a client-side rejection, with a
    /// locally generated reference.
    pub fn rejected(payment_id: Uuid) -> Self {
        Self {
            payment_id,
            provider_reference: format!("SIM_{}", Utc::now().timestamp_millis()),
            status: PaymentStatus::Failed,
        }
    }
}

/// Provider-specific request shaping. Every provider exposes the same
/// capability; only the wire representation differs.
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;
    fn shape(&self, request: &ProviderRequest) -> ProviderRequest;
}

/// Provider A expects masked card numbers for PCI compliance; amount and
/// currency pass through unchanged.
pub struct ProviderA;

impl ProviderAdapter for ProviderA {
    fn id(&self) -> ProviderId {
        ProviderId::ProviderA
    }

    fn shape(&self, request: &ProviderRequest) -> ProviderRequest {
        let mut shaped = request.clone();
        shaped.card_number = mask_card_number(&request.card_number);
        shaped
    }
}

/// Provider B expects the amount in minor units (multiplied by 100 and
/// rounded half-up to zero decimal places); the card number passes
/// through unmasked.
pub struct ProviderB;

impl ProviderAdapter for ProviderB {
    fn id(&self) -> ProviderId {
        ProviderId::ProviderB
    }

    fn shape(&self, request: &ProviderRequest) -> ProviderRequest {
        let mut shaped = request.clone();
        shaped.amount = (request.amount * dec!(100))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        shaped
    }
}

fn mask_card_number(card_number: &str) -> String {
    if card_number.len() < 4 {
        return card_number.to_string();
    }
    let last_four = &card_number[card_number.len() - 4..];
    format!("{}{}", "*".repeat(12), last_four)
}

struct RegisteredProvider {
    adapter: Box<dyn ProviderAdapter>,
    endpoint: String,
    client: ResilientClient,
}

/// Immutable mapping from provider id to its adapter, endpoint and
/// resilience policy. Built once at process start and shared read-only;
/// each provider gets its own circuit breaker over a shared transport.
pub struct ProviderGateway {
    providers: HashMap<ProviderId, RegisteredProvider>,
}

impl ProviderGateway {
    pub fn new(transport: Arc<dyn ProviderTransport>, config: &GatewayConfig) -> Self {
        let mut providers: HashMap<ProviderId, RegisteredProvider> = HashMap::new();
        let adapters: Vec<(Box<dyn ProviderAdapter>, &str)> = vec![
            (Box::new(ProviderA), config.provider_a_endpoint.as_str()),
            (Box::new(ProviderB), config.provider_b_endpoint.as_str()),
        ];
        for (adapter, endpoint) in adapters {
            providers.insert(
                adapter.id(),
                RegisteredProvider {
                    endpoint: endpoint.to_string(),
                    client: ResilientClient::new(
                        transport.clone(),
                        config.retry.clone(),
                        CircuitBreaker::new(config.breaker.clone()),
                    ),
                    adapter,
                },
            );
        }
        Self { providers }
    }

    /// Shapes the payment for its chosen provider and performs the call
    /// under the resilience policy.
    pub async fn dispatch(&self, payment: &Payment) -> Result<ProviderResponse> {
        let registered = self
            .providers
            .get(&payment.provider)
            .ok_or(RoutingError::UnknownProvider(payment.provider))?;

        tracing::info!(payment_id = %payment.id, provider = %payment.provider, "dispatching payment to provider");

        let request = ProviderRequest::from(payment);
        let shaped = registered.adapter.shape(&request);
        registered
            .client
            .execute(payment.provider, &registered.endpoint, &shaped)
            .await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::transport::{ProviderTransport, TransportError};
    use super::{ProviderRequest, ProviderResponse};
    use crate::domain::payment::PaymentStatus;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transport replaying a scripted sequence of outcomes. Once the
    /// script is exhausted it keeps returning the configured default.
    pub struct ScriptedTransport {
        script: Mutex<VecDeque<Result<ProviderResponse, TransportError>>>,
        default_status: Option<u16>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        pub fn new(outcomes: Vec<Result<ProviderResponse, TransportError>>) -> Self {
            Self {
                script: Mutex::new(outcomes.into()),
                default_status: None,
                calls: AtomicUsize::new(0),
            }
        }

        /// Always answers with the given HTTP status.
        pub fn always_status(status: u16) -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                default_status: Some(status),
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
        ) -> Result<ProviderResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let scripted = self.script.lock().expect("script lock").pop_front();
            match scripted {
                Some(outcome) => outcome,
                None => match self.default_status {
                    Some(status) => Err(TransportError::Status {
                        status,
                        body: String::new(),
                    }),
                    None => Ok(ProviderResponse {
                        payment_id: request.payment_id,
                        provider_reference: "REF_OK".to_string(),
                        status: PaymentStatus::Completed,
                    }),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedTransport;
    use super::*;
    use crate::domain::payment::PaymentRequest;

    fn canonical_request() -> ProviderRequest {
        ProviderRequest {
            payment_id: Uuid::new_v4(),
            amount: dec!(19.995),
            currency: "USD".to_string(),
            card_number: "4111111111111111".to_string(),
            bin: "411111".to_string(),
        }
    }

    #[test]
    fn test_provider_a_masks_card_number() {
        let request = canonical_request();
        let shaped = ProviderA.shape(&request);
        assert_eq!(shaped.card_number, "************1111");
        // Amount and currency pass through unchanged
        assert_eq!(shaped.amount, request.amount);
        assert_eq!(shaped.currency, request.currency);
        assert_eq!(shaped.bin, request.bin);
    }

    #[test]
    fn test_provider_b_converts_to_minor_units() {
        let request = canonical_request();
        let shaped = ProviderB.shape(&request);
        // 19.995 * 100 = 1999.5, rounded half-up
        assert_eq!(shaped.amount, dec!(2000));
        // Card number passes through unmasked
        assert_eq!(shaped.card_number, request.card_number);
    }

    #[test]
    fn test_provider_b_rounds_half_up() {
        let mut request = canonical_request();
        request.amount = dec!(10.004);
        assert_eq!(ProviderB.shape(&request).amount, dec!(1000));

        request.amount = dec!(10.005);
        assert_eq!(ProviderB.shape(&request).amount, dec!(1001));
    }

    #[test]
    fn test_short_card_number_left_untouched() {
        assert_eq!(mask_card_number("123"), "123");
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let json = serde_json::to_value(canonical_request()).unwrap();
        assert!(json.get("paymentId").is_some());
        assert!(json.get("cardNumber").is_some());
    }

    #[tokio::test]
    async fn test_dispatch_shapes_and_calls_provider() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let gateway = ProviderGateway::new(transport.clone(), &GatewayConfig::default());

        let request = PaymentRequest {
            amount: dec!(100.00),
            currency: "USD".to_string(),
            card_number: "4111111111111111".to_string(),
        };
        let payment = Payment::initiate(&request, ProviderId::ProviderA);

        let response = gateway.dispatch(&payment).await.unwrap();
        assert_eq!(response.status, PaymentStatus::Completed);
        assert_eq!(transport.calls(), 1);
    }
}
