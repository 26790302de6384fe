use crate::error::RoutingError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of an external payment provider.
///
/// The set of providers is fixed at compile time; the gateway builds an
/// immutable registry over these ids at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderId {
    #[serde(rename = "PROVIDER_A")]
    ProviderA,
    #[serde(rename = "PROVIDER_B")]
    ProviderB,
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderId::ProviderA => write!(f, "PROVIDER_A"),
            ProviderId::ProviderB => write!(f, "PROVIDER_B"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Initiated,
    /// Intermediate state kept for wire compatibility; the accept-payment
    /// flow never produces it.
    Processing,
    Completed,
    Failed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Initiated => write!(f, "INITIATED"),
            PaymentStatus::Processing => write!(f, "PROCESSING"),
            PaymentStatus::Completed => write!(f, "COMPLETED"),
            PaymentStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// An inbound request to accept a payment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub currency: String,
    pub card_number: String,
}

impl PaymentRequest {
    /// Checks the request against the acceptance rules: positive amount,
    /// ISO-4217 currency code, 16-digit card number.
    pub fn validate(&self) -> Result<(), RoutingError> {
        if self.amount <= Decimal::ZERO {
            return Err(RoutingError::Validation(
                "amount must be greater than 0".to_string(),
            ));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(RoutingError::Validation(
                "currency must be a 3-letter ISO 4217 code".to_string(),
            ));
        }
        if self.card_number.len() != 16 || !self.card_number.chars().all(|c| c.is_ascii_digit()) {
            return Err(RoutingError::Validation(
                "card number must be 16 digits".to_string(),
            ));
        }
        Ok(())
    }

    /// First six digits of the card number (the issuing-scheme BIN).
    pub fn bin(&self) -> &str {
        if self.card_number.len() >= 6 {
            &self.card_number[..6]
        } else {
            ""
        }
    }
}

/// A payment accepted by the orchestrator.
///
/// Plain value record; all mutation goes through explicit store operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub card_number: String,
    pub bin: String,
    pub provider: ProviderId,
    pub status: PaymentStatus,
    pub provider_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Builds a new payment in `Initiated` state from an accepted request.
    pub fn initiate(request: &PaymentRequest, provider: ProviderId) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            amount: request.amount,
            currency: request.currency.clone(),
            card_number: request.card_number.clone(),
            bin: request.bin().to_string(),
            provider,
            status: PaymentStatus::Initiated,
            provider_reference: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valid_request() -> PaymentRequest {
        PaymentRequest {
            amount: dec!(100.00),
            currency: "USD".to_string(),
            card_number: "4111111111111111".to_string(),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let mut request = valid_request();
        request.amount = dec!(0.00);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_bad_currency_rejected() {
        let mut request = valid_request();
        request.currency = "usd".to_string();
        assert!(request.validate().is_err());

        request.currency = "USDT".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_bad_card_number_rejected() {
        let mut request = valid_request();
        request.card_number = "41111111".to_string();
        assert!(request.validate().is_err());

        request.card_number = "4111x11111111111".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_bin_is_first_six_digits() {
        assert_eq!(valid_request().bin(), "411111");
    }

    #[test]
    fn test_initiate_sets_initial_state() {
        let payment = Payment::initiate(&valid_request(), ProviderId::ProviderA);
        assert_eq!(payment.status, PaymentStatus::Initiated);
        assert_eq!(payment.bin, "411111");
        assert_eq!(payment.provider_reference, None);
        assert_eq!(payment.created_at, payment.updated_at);
    }

    #[test]
    fn test_status_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&PaymentStatus::Completed).unwrap();
        assert_eq!(json, "\"COMPLETED\"");
        let provider = serde_json::to_string(&ProviderId::ProviderB).unwrap();
        assert_eq!(provider, "\"PROVIDER_B\"");
    }
}
