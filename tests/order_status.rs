mod common;

use common::{
    add_to_cart, checkout_request, create_category, create_product, create_user, setup_state,
    stock_of,
};
use shop_api::{
    dto::orders::OrderStatusUpdateRequest,
    entity::enums::{OrderStatus, PaymentGateway, PaymentMethod, PaymentStatus},
    error::AppError,
    models::Order,
    services::{order_service, status_machine::update_order_status},
    state::AppState,
};
use uuid::Uuid;

struct Placed {
    order: Order,
    first: Uuid,
    second: Uuid,
}

/// Two products (stock 10 and 5), order of 3 + 2 placed through checkout.
async fn place_order(state: &AppState, method: PaymentMethod) -> anyhow::Result<Placed> {
    let user = create_user(state).await?;
    let category = create_category(state).await?;
    let first = create_product(state, category.id, "Tablette", "250.00", 10).await?;
    let second = create_product(state, category.id, "Chargeur", "19.90", 5).await?;
    add_to_cart(state, user.id, first.id, 3).await?;
    add_to_cart(state, user.id, second.id, 2).await?;

    let gateway = (method == PaymentMethod::OnlinePayment).then_some(PaymentGateway::Paypal);
    let order = order_service::checkout(state, checkout_request(user.id, method, gateway))
        .await?
        .data
        .unwrap();
    Ok(Placed {
        order,
        first: first.id,
        second: second.id,
    })
}

async fn set_status(
    state: &AppState,
    order_id: Uuid,
    order_status: OrderStatus,
) -> Result<Order, AppError> {
    let response = update_order_status(
        state,
        order_id,
        OrderStatusUpdateRequest {
            order_status,
            payment_status: None,
        },
    )
    .await?;
    Ok(response.data.unwrap())
}

#[tokio::test]
async fn cancel_restores_stock_exactly_once() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let placed = place_order(&state, PaymentMethod::CashOnDelivery).await?;
    assert_eq!(stock_of(&state, placed.first).await?, 7);
    assert_eq!(stock_of(&state, placed.second).await?, 3);

    let cancelled = set_status(&state, placed.order.id, OrderStatus::Cancelled).await?;
    assert_eq!(cancelled.order_status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&state, placed.first).await?, 10);
    assert_eq!(stock_of(&state, placed.second).await?, 5);

    // Cancelling again is a no-op and must not restore a second time.
    let again = set_status(&state, placed.order.id, OrderStatus::Cancelled).await?;
    assert_eq!(again.order_status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&state, placed.first).await?, 10);
    assert_eq!(stock_of(&state, placed.second).await?, 5);
    Ok(())
}

#[tokio::test]
async fn cancelled_order_cannot_be_reopened() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let placed = place_order(&state, PaymentMethod::CashOnDelivery).await?;
    set_status(&state, placed.order.id, OrderStatus::Cancelled).await?;

    for target in [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        let err = set_status(&state, placed.order.id, target).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)), "{target:?}");
    }
    assert_eq!(stock_of(&state, placed.first).await?, 10);
    Ok(())
}

#[tokio::test]
async fn delivered_order_rejects_every_other_status() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let placed = place_order(&state, PaymentMethod::CashOnDelivery).await?;

    set_status(&state, placed.order.id, OrderStatus::Shipped).await?;
    let delivered = set_status(&state, placed.order.id, OrderStatus::Delivered).await?;
    assert_eq!(delivered.order_status, OrderStatus::Delivered);

    for target in [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Cancelled,
    ] {
        let err = set_status(&state, placed.order.id, target).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)), "{target:?}");
    }

    // Stock stays decremented: the rejected cancel restored nothing.
    assert_eq!(stock_of(&state, placed.first).await?, 7);
    let current = order_service::get_order(&state, placed.order.id).await?.data.unwrap();
    assert_eq!(current.order_status, OrderStatus::Delivered);
    Ok(())
}

#[tokio::test]
async fn open_order_can_move_back() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let placed = place_order(&state, PaymentMethod::CashOnDelivery).await?;
    set_status(&state, placed.order.id, OrderStatus::Shipped).await?;

    let moved = set_status(&state, placed.order.id, OrderStatus::Processing).await?;
    assert_eq!(moved.order_status, OrderStatus::Processing);

    // Stock is untouched by moves between open statuses.
    assert_eq!(stock_of(&state, placed.first).await?, 7);
    Ok(())
}

#[tokio::test]
async fn payment_status_moves_in_lockstep() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let placed = place_order(&state, PaymentMethod::OnlinePayment).await?;
    assert!(placed.order.payment.is_some());

    let paid = update_order_status(
        &state,
        placed.order.id,
        OrderStatusUpdateRequest {
            order_status: OrderStatus::Paid,
            payment_status: Some(PaymentStatus::Success),
        },
    )
    .await?
    .data
    .unwrap();

    assert_eq!(paid.order_status, OrderStatus::Paid);
    assert_eq!(paid.payment_status, PaymentStatus::Success);
    let payment = paid.payment.expect("payment row");
    assert_eq!(payment.payment_status, PaymentStatus::Success);
    assert!(payment.payment_date.is_some());
    Ok(())
}

#[tokio::test]
async fn unknown_order_is_not_found() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let err = set_status(&state, Uuid::new_v4(), OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.to_string(), "Order not found");
    Ok(())
}
