use crate::domain::payment::ProviderId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Amounts above this threshold switch to amount-based routing.
const HIGH_AMOUNT_THRESHOLD: Decimal = dec!(1000.00);

/// Selects the provider for a payment from its card BIN, currency and
/// amount. Pure and total: any input maps to a provider.
///
/// Precedence, first match wins:
/// 1. BIN starting with `4` (Visa range) routes to Provider A.
/// 2. BIN starting with `5` (Mastercard range) routes to Provider B.
/// 3. Amounts strictly above 1000.00 route to Provider B for USD,
///    Provider A for any other currency.
/// 4. Everything else defaults to Provider A.
pub fn determine_provider(bin: Option<&str>, currency: &str, amount: Decimal) -> ProviderId {
    match bin.and_then(|b| b.chars().next()) {
        Some('4') => {
            tracing::debug!("routing to Provider A based on Visa BIN range");
            return ProviderId::ProviderA;
        }
        Some('5') => {
            tracing::debug!("routing to Provider B based on Mastercard BIN range");
            return ProviderId::ProviderB;
        }
        _ => {}
    }

    if amount > HIGH_AMOUNT_THRESHOLD {
        if currency == "USD" {
            tracing::debug!("routing to Provider B based on high USD amount");
            return ProviderId::ProviderB;
        }
        tracing::debug!("routing to Provider A based on high non-USD amount");
        return ProviderId::ProviderA;
    }

    tracing::debug!("using default routing to Provider A");
    ProviderId::ProviderA
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visa_bin_routes_to_provider_a() {
        // BIN rules win regardless of amount or currency
        assert_eq!(
            determine_provider(Some("411111"), "USD", dec!(5000.00)),
            ProviderId::ProviderA
        );
        assert_eq!(
            determine_provider(Some("400000"), "EUR", dec!(1.00)),
            ProviderId::ProviderA
        );
    }

    #[test]
    fn test_mastercard_bin_routes_to_provider_b() {
        assert_eq!(
            determine_provider(Some("555555"), "EUR", dec!(10.00)),
            ProviderId::ProviderB
        );
        assert_eq!(
            determine_provider(Some("510000"), "USD", dec!(2000.00)),
            ProviderId::ProviderB
        );
    }

    #[test]
    fn test_high_usd_amount_routes_to_provider_b() {
        assert_eq!(
            determine_provider(None, "USD", dec!(1500.00)),
            ProviderId::ProviderB
        );
    }

    #[test]
    fn test_high_non_usd_amount_routes_to_provider_a() {
        assert_eq!(
            determine_provider(None, "EUR", dec!(1500.00)),
            ProviderId::ProviderA
        );
    }

    #[test]
    fn test_low_amount_defaults_to_provider_a() {
        assert_eq!(
            determine_provider(None, "USD", dec!(500.00)),
            ProviderId::ProviderA
        );
    }

    #[test]
    fn test_threshold_is_strict() {
        // Exactly 1000.00 falls to the default path
        assert_eq!(
            determine_provider(None, "USD", dec!(1000.00)),
            ProviderId::ProviderA
        );
        assert_eq!(
            determine_provider(None, "USD", dec!(1000.01)),
            ProviderId::ProviderB
        );
    }

    #[test]
    fn test_unrecognized_bin_falls_to_amount_rules() {
        assert_eq!(
            determine_provider(Some("371111"), "USD", dec!(1500.00)),
            ProviderId::ProviderB
        );
        assert_eq!(
            determine_provider(Some(""), "USD", dec!(500.00)),
            ProviderId::ProviderA
        );
    }
}
