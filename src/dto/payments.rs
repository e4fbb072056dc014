use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    /// Amount in major currency units, e.g. `149.90`.
    #[schema(value_type = String, example = "149.90")]
    pub amount: Decimal,
    /// ISO currency code; the configured default is used when absent.
    pub currency: Option<String>,
}
