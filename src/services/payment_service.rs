use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::Deserialize;

use crate::{
    config::StripeConfig,
    dto::payments::PaymentIntentRequest,
    error::{AppError, AppResult},
    models::PaymentIntent,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// External card-payment processor able to open payment intents.
#[async_trait]
pub trait PaymentIntentGateway: Send + Sync {
    /// `amount_minor` is expressed in the currency's minor unit (cents).
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> anyhow::Result<PaymentIntent>;

    fn default_currency(&self) -> &str;
}

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

#[derive(Deserialize)]
struct StripeIntent {
    id: String,
    client_secret: Option<String>,
    amount: i64,
    currency: String,
    status: String,
}

#[async_trait]
impl PaymentIntentGateway for StripeGateway {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> anyhow::Result<PaymentIntent> {
        let secret = self
            .config
            .secret_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("STRIPE_SECRET_KEY is not set"))?;

        let url = format!(
            "{}/v1/payment_intents",
            self.config.api_base.trim_end_matches('/')
        );
        let amount = amount_minor.to_string();
        let response = self
            .client
            .post(url)
            .bearer_auth(secret)
            .form(&[("amount", amount.as_str()), ("currency", currency)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("stripe rejected payment intent ({status}): {body}");
        }

        let intent: StripeIntent = response.json().await?;
        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
            amount: intent.amount,
            currency: intent.currency,
            status: intent.status,
        })
    }

    fn default_currency(&self) -> &str {
        &self.config.currency
    }
}

/// Converts a major-unit amount to minor units, rounding half away from zero.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

pub async fn create_payment_intent(
    state: &AppState,
    payload: PaymentIntentRequest,
) -> AppResult<ApiResponse<PaymentIntent>> {
    if payload.amount <= Decimal::ZERO {
        return Err(AppError::bad_request("Amount must be greater than zero"));
    }
    let amount_minor = to_minor_units(payload.amount)
        .ok_or_else(|| AppError::bad_request("Amount is out of range"))?;

    let currency = payload
        .currency
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| state.payments.default_currency().to_string());

    let intent = state
        .payments
        .create_payment_intent(amount_minor, &currency)
        .await
        .map_err(AppError::Internal)?;

    tracing::info!(intent_id = %intent.id, amount_minor, currency = %currency, "payment intent created");

    Ok(ApiResponse::success(
        "Payment intent created",
        intent,
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn minor_units_scale_by_one_hundred() {
        assert_eq!(to_minor_units(Decimal::from(300)), Some(30_000));
        assert_eq!(to_minor_units(Decimal::from_str("149.90").unwrap()), Some(14_990));
    }

    #[test]
    fn minor_units_round_half_away_from_zero() {
        assert_eq!(to_minor_units(Decimal::from_str("0.005").unwrap()), Some(1));
        assert_eq!(to_minor_units(Decimal::from_str("10.004").unwrap()), Some(1_000));
    }
}
