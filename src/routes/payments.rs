use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::payments::PaymentIntentRequest, error::AppResult, models::PaymentIntent,
    response::ApiResponse, services::payment_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/create-payment-intent", post(create_payment_intent))
}

#[utoipa::path(
    post,
    path = "/api/payment/create-payment-intent",
    request_body = PaymentIntentRequest,
    responses(
        (status = 200, description = "Intent opened with the payment processor", body = ApiResponse<PaymentIntent>),
        (status = 400, description = "Amount must be positive"),
        (status = 500, description = "Payment processor failure"),
    ),
    tag = "Payments"
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(payload): Json<PaymentIntentRequest>,
) -> AppResult<Json<ApiResponse<PaymentIntent>>> {
    Ok(Json(
        payment_service::create_payment_intent(&state, payload).await?,
    ))
}
