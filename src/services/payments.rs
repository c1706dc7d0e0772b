use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use crate::config::StripeConfig;
use crate::errors::ServiceError;

pub const STATUS_SUCCEEDED: &str = "succeeded";

/// Payment intent as reported by the provider. Amount is in minor units.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub status: String,
    #[serde(default)]
    pub amount: i64,
}

impl PaymentIntent {
    pub fn is_succeeded(&self) -> bool {
        self.status == STATUS_SUCCEEDED
    }
}

/// Seam to the external payment provider. Amounts are decimal dollars;
/// implementations convert to the provider's minor units.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(&self, amount: Decimal) -> Result<PaymentIntent, ServiceError>;
    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, ServiceError>;
}

/// Stripe-backed gateway speaking the form-encoded HTTP API directly.
#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    config: StripeConfig,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

/// Converts decimal dollars to integer minor units (cents).
pub fn to_minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    if amount < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Payment amount cannot be negative".to_string(),
        ));
    }
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| ServiceError::ValidationError("Payment amount out of range".to_string()))
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self))]
    async fn create_payment_intent(&self, amount: Decimal) -> Result<PaymentIntent, ServiceError> {
        let url = format!("{}/payment_intents", self.config.api_base);
        let minor_units = to_minor_units(amount)?;

        let params = [
            ("amount", minor_units.to_string()),
            ("currency", self.config.currency.clone()),
        ];

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalApiError(format!("Payment request failed: {e}")))?;

        if response.status().is_success() {
            response.json::<PaymentIntent>().await.map_err(|e| {
                ServiceError::ExternalApiError(format!("Malformed payment response: {e}"))
            })
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ServiceError::ExternalApiError(format!(
                "Payment intent creation failed ({status}): {body}"
            )))
        }
    }

    #[instrument(skip(self))]
    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, ServiceError> {
        let url = format!("{}/payment_intents/{id}", self.config.api_base);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalApiError(format!("Payment request failed: {e}")))?;

        if response.status().is_success() {
            response.json::<PaymentIntent>().await.map_err(|e| {
                ServiceError::ExternalApiError(format!("Malformed payment response: {e}"))
            })
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ServiceError::ExternalApiError(format!(
                "Payment intent lookup failed ({status}): {body}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn dollars_convert_to_cents() {
        assert_eq!(to_minor_units(dec!(10.00)).unwrap(), 1000);
        assert_eq!(to_minor_units(dec!(9.99)).unwrap(), 999);
        assert_eq!(to_minor_units(dec!(0)).unwrap(), 0);
    }

    #[test]
    fn sub_cent_amounts_round() {
        assert_eq!(to_minor_units(dec!(1.005)).unwrap(), 100);
        assert_eq!(to_minor_units(dec!(1.015)).unwrap(), 102);
    }

    #[test]
    fn negative_amount_rejected() {
        assert!(to_minor_units(dec!(-0.01)).is_err());
    }

    #[test]
    fn succeeded_status_detection() {
        let intent = PaymentIntent {
            id: "pi_1".to_string(),
            client_secret: Some("pi_1_secret".to_string()),
            status: "succeeded".to_string(),
            amount: 1000,
        };
        assert!(intent.is_succeeded());

        let pending = PaymentIntent {
            status: "requires_payment_method".to_string(),
            ..intent
        };
        assert!(!pending.is_succeeded());
    }

    #[tokio::test]
    async fn gateway_trait_is_mockable() {
        use std::sync::Arc;

        let mut mock = MockPaymentGateway::new();
        mock.expect_create_payment_intent().returning(|_| {
            Ok(PaymentIntent {
                id: "pi_mock".to_string(),
                client_secret: Some("pi_mock_secret".to_string()),
                status: "requires_payment_method".to_string(),
                amount: 0,
            })
        });

        let gateway: Arc<dyn PaymentGateway> = Arc::new(mock);
        let intent = gateway.create_payment_intent(dec!(5.00)).await.unwrap();
        assert_eq!(intent.id, "pi_mock");
    }

    #[test]
    fn intent_deserializes_without_client_secret() {
        let intent: PaymentIntent = serde_json::from_str(
            r#"{"id": "pi_2", "status": "processing", "amount": 500}"#,
        )
        .unwrap();
        assert_eq!(intent.id, "pi_2");
        assert!(intent.client_secret.is_none());
    }
}
