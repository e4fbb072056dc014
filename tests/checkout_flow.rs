mod common;

use common::{
    add_to_cart, checkout_request, create_category, create_product, create_user, dec, setup_state,
    stock_of,
};
use shop_api::{
    entity::enums::{OrderStatus, PaymentGateway, PaymentMethod, PaymentStatus},
    error::AppError,
    services::{cart_service, order_service},
    state::AppState,
};
use uuid::Uuid;

async fn order_count(state: &AppState, user_id: Uuid) -> anyhow::Result<usize> {
    let orders = order_service::list_orders(state, Some(user_id)).await?;
    Ok(orders.data.unwrap().items.len())
}

#[tokio::test]
async fn cash_checkout_decrements_stock_and_empties_cart() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state).await?;
    let category = create_category(&state).await?;
    let product = create_product(&state, category.id, "Laptop 14", "100.00", 10).await?;

    add_to_cart(&state, user.id, product.id, 3).await?;

    let order = order_service::checkout(
        &state,
        checkout_request(user.id, PaymentMethod::CashOnDelivery, None),
    )
    .await?
    .data
    .unwrap();

    assert_eq!(order.total_amount, dec("300.00"));
    assert_eq!(order.order_status, OrderStatus::Processing);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert!(order.payment.is_none());
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 3);
    assert_eq!(order.items[0].unit_price, dec("100.00"));
    assert_eq!(order.items[0].product_name, "Laptop 14");

    assert_eq!(stock_of(&state, product.id).await?, 7);
    let cart = cart_service::get_cart(&state, user.id).await?.data.unwrap();
    assert!(cart.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn online_checkout_records_pending_payment() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state).await?;
    let category = create_category(&state).await?;
    let laptop = create_product(&state, category.id, "Laptop 14", "8999.00", 10).await?;
    let headset = create_product(&state, category.id, "Casque Bluetooth", "599.00", 25).await?;

    add_to_cart(&state, user.id, laptop.id, 1).await?;
    add_to_cart(&state, user.id, headset.id, 2).await?;

    let order = order_service::checkout(
        &state,
        checkout_request(
            user.id,
            PaymentMethod::OnlinePayment,
            Some(PaymentGateway::Stripe),
        ),
    )
    .await?
    .data
    .unwrap();

    assert_eq!(order.total_amount, dec("10197.00"));
    let payment = order.payment.expect("online orders carry a payment");
    assert_eq!(payment.payment_method, PaymentGateway::Stripe);
    assert_eq!(payment.payment_status, PaymentStatus::Pending);
    assert_eq!(payment.amount, dec("10197.00"));
    assert!(payment.payment_date.is_none());

    let fetched = order_service::get_order(&state, order.id).await?.data.unwrap();
    assert_eq!(fetched.items.len(), 2);
    assert!(fetched.payment.is_some());
    Ok(())
}

#[tokio::test]
async fn online_checkout_without_gateway_rolls_everything_back() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state).await?;
    let category = create_category(&state).await?;
    let product = create_product(&state, category.id, "Laptop 14", "100.00", 10).await?;
    add_to_cart(&state, user.id, product.id, 2).await?;

    let err = order_service::checkout(
        &state,
        checkout_request(user.id, PaymentMethod::OnlinePayment, None),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(err.to_string(), "Payment gateway is required for online payments");
    assert_eq!(order_count(&state, user.id).await?, 0);
    assert_eq!(stock_of(&state, product.id).await?, 10);
    let cart = cart_service::get_cart(&state, user.id).await?.data.unwrap();
    assert_eq!(cart.items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn insufficient_stock_on_any_line_aborts_the_whole_checkout() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let buyer = create_user(&state).await?;
    let rival = create_user(&state).await?;
    let category = create_category(&state).await?;
    let plenty = create_product(&state, category.id, "Souris", "50.00", 20).await?;
    let scarce = create_product(&state, category.id, "Ecran 27", "1500.00", 2).await?;

    add_to_cart(&state, buyer.id, plenty.id, 4).await?;
    add_to_cart(&state, buyer.id, scarce.id, 2).await?;
    add_to_cart(&state, rival.id, scarce.id, 1).await?;

    // The rival takes one unit first, so the buyer's second line no longer fits.
    order_service::checkout(
        &state,
        checkout_request(rival.id, PaymentMethod::CashOnDelivery, None),
    )
    .await?;

    let err = order_service::checkout(
        &state,
        checkout_request(buyer.id, PaymentMethod::CashOnDelivery, None),
    )
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "Not enough stock for product: Ecran 27");
    assert_eq!(stock_of(&state, plenty.id).await?, 20);
    assert_eq!(stock_of(&state, scarce.id).await?, 1);
    assert_eq!(order_count(&state, buyer.id).await?, 0);
    assert_eq!(order_count(&state, rival.id).await?, 1);
    Ok(())
}

#[tokio::test]
async fn empty_cart_and_unknown_user_are_rejected() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state).await?;

    let err = order_service::checkout(
        &state,
        checkout_request(user.id, PaymentMethod::CashOnDelivery, None),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Cart is empty");

    let err = order_service::checkout(
        &state,
        checkout_request(Uuid::new_v4(), PaymentMethod::CashOnDelivery, None),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.to_string(), "User not found");
    Ok(())
}

#[tokio::test]
async fn blank_shipping_fields_fail_validation() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state).await?;

    let mut request = checkout_request(user.id, PaymentMethod::CashOnDelivery, None);
    request.shipping_name = "   ".to_string();
    request.shipping_email = "not-an-email".to_string();

    let err = order_service::checkout(&state, request).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn orders_are_listed_per_user_newest_first() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state).await?;
    let other = create_user(&state).await?;
    let category = create_category(&state).await?;
    let product = create_product(&state, category.id, "Clavier", "40.00", 10).await?;
    let cable = create_product(&state, category.id, "Cable USB", "8.00", 10).await?;

    add_to_cart(&state, user.id, product.id, 1).await?;
    add_to_cart(&state, user.id, cable.id, 2).await?;
    let first = order_service::checkout(
        &state,
        checkout_request(user.id, PaymentMethod::CashOnDelivery, None),
    )
    .await?
    .data
    .unwrap();
    add_to_cart(&state, user.id, product.id, 2).await?;
    let second = order_service::checkout(
        &state,
        checkout_request(user.id, PaymentMethod::CashOnDelivery, None),
    )
    .await?
    .data
    .unwrap();
    add_to_cart(&state, other.id, product.id, 1).await?;
    order_service::checkout(
        &state,
        checkout_request(other.id, PaymentMethod::CashOnDelivery, None),
    )
    .await?;

    let mine = order_service::list_orders(&state, Some(user.id)).await?;
    let ids: Vec<_> = mine.data.unwrap().items.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(mine.meta.unwrap().total, Some(2));

    let all = order_service::list_orders(&state, None).await?.data.unwrap();
    assert!(all.items.len() >= 3);
    assert!(all.items.iter().any(|o| o.user_id == other.id));
    assert!(all.items.iter().all(|o| !o.items.is_empty()));

    // Both read paths return line items in the same order.
    let listed = order_service::list_orders(&state, Some(user.id)).await?.data.unwrap();
    for order in &listed.items {
        let single = order_service::get_order(&state, order.id).await?.data.unwrap();
        let listed_ids: Vec<_> = order.items.iter().map(|i| i.id).collect();
        let single_ids: Vec<_> = single.items.iter().map(|i| i.id).collect();
        assert_eq!(listed_ids, single_ids);
    }

    let err = order_service::list_orders(&state, Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "User not found");

    let err = order_service::get_order(&state, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Order not found");
    Ok(())
}
