mod common;

use std::sync::Arc;

use common::{FakeGateway, dec, setup_state_with};
use shop_api::{dto::payments::PaymentIntentRequest, error::AppError, services::payment_service};

#[tokio::test]
async fn amount_is_sent_in_minor_units_with_default_currency() -> anyhow::Result<()> {
    let gateway = Arc::new(FakeGateway::default());
    let state = setup_state_with(gateway.clone()).await?;

    let intent = payment_service::create_payment_intent(
        &state,
        PaymentIntentRequest {
            amount: dec("149.90"),
            currency: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(intent.amount, 14_990);
    assert_eq!(intent.currency, "mad");
    assert_eq!(intent.client_secret.as_deref(), Some("pi_test_secret"));

    payment_service::create_payment_intent(
        &state,
        PaymentIntentRequest {
            amount: dec("10"),
            currency: Some("EUR".to_string()),
        },
    )
    .await?;

    let calls = gateway.calls.lock().unwrap().clone();
    assert_eq!(calls, vec![(14_990, "mad".to_string()), (1_000, "eur".to_string())]);
    Ok(())
}

#[tokio::test]
async fn non_positive_amount_never_reaches_the_gateway() -> anyhow::Result<()> {
    let gateway = Arc::new(FakeGateway::default());
    let state = setup_state_with(gateway.clone()).await?;

    let err = payment_service::create_payment_intent(
        &state,
        PaymentIntentRequest {
            amount: dec("0"),
            currency: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(gateway.calls.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn gateway_failure_surfaces_as_internal_error() -> anyhow::Result<()> {
    let gateway = Arc::new(FakeGateway {
        fail: true,
        ..FakeGateway::default()
    });
    let state = setup_state_with(gateway).await?;

    let err = payment_service::create_payment_intent(
        &state,
        PaymentIntentRequest {
            amount: dec("25.00"),
            currency: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));
    assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}
