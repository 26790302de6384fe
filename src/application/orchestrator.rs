use crate::domain::outbox::{
    AGGREGATE_PAYMENT, EVENT_PAYMENT_PROCESSED, EVENT_PAYMENT_STATUS_CHANGED, OutboxEvent,
};
use crate::domain::payment::{Payment, PaymentRequest, PaymentStatus};
use crate::domain::ports::{SharedOutboxStore, SharedPaymentStore};
use crate::domain::routing::determine_provider;
use crate::error::{Result, RoutingError};
use crate::gateway::ProviderGateway;
use chrono::Utc;
use uuid::Uuid;

/// Composes routing, gateway and outbox into the end-to-end accept-payment
/// flow.
pub struct PaymentOrchestrator {
    payments: SharedPaymentStore,
    outbox: SharedOutboxStore,
    gateway: ProviderGateway,
}

impl PaymentOrchestrator {
    pub fn new(
        payments: SharedPaymentStore,
        outbox: SharedOutboxStore,
        gateway: ProviderGateway,
    ) -> Self {
        Self {
            payments,
            outbox,
            gateway,
        }
    }

    /// Accepts a payment: route, persist the initial state, invoke the
    /// provider, persist the outcome and stage an outbox event.
    ///
    /// The initial and final persistence are separate units of work with
    /// the provider call in between; a crash in that window leaves the
    /// payment at `Initiated` with no compensating event.
    pub async fn process_payment(&self, request: PaymentRequest) -> Result<Payment> {
        request.validate()?;

        let provider = determine_provider(Some(request.bin()), &request.currency, request.amount);
        let mut payment = Payment::initiate(&request, provider);
        tracing::info!(payment_id = %payment.id, %provider, "processing payment request");

        self.payments.store(payment.clone()).await?;

        let response = self.gateway.dispatch(&payment).await?;

        payment.status = response.status;
        payment.provider_reference = Some(response.provider_reference);
        payment.updated_at = Utc::now();
        self.payments.store(payment.clone()).await?;

        self.stage_event(&payment, EVENT_PAYMENT_PROCESSED).await?;

        tracing::info!(payment_id = %payment.id, status = %payment.status, "payment processed");
        Ok(payment)
    }

    pub async fn get_payment(&self, id: Uuid) -> Result<Payment> {
        self.payments
            .get(id)
            .await?
            .ok_or(RoutingError::PaymentNotFound(id))
    }

    /// Applies an externally reported status change and stages the
    /// corresponding outbox event.
    pub async fn update_payment_status(
        &self,
        id: Uuid,
        provider_reference: String,
        status: PaymentStatus,
    ) -> Result<Payment> {
        let mut payment = self.get_payment(id).await?;

        payment.status = status;
        payment.provider_reference = Some(provider_reference);
        payment.updated_at = Utc::now();
        self.payments.store(payment.clone()).await?;

        self.stage_event(&payment, EVENT_PAYMENT_STATUS_CHANGED)
            .await?;
        Ok(payment)
    }

    async fn stage_event(&self, payment: &Payment, event_type: &str) -> Result<()> {
        let snapshot = serde_json::to_string(payment)?;
        self.outbox
            .append(OutboxEvent::new(
                AGGREGATE_PAYMENT,
                payment.id.to_string(),
                event_type,
                snapshot,
            ))
            .await
    }
}
