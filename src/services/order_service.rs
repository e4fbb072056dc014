use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbBackend, EntityTrait,
    LoaderTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::orders::{CheckoutRequest, OrderList},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        enums::{OrderStatus, PaymentGateway, PaymentMethod, PaymentStatus},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        payments::{
            ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments,
            Model as PaymentModel,
        },
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    models::Order,
    response::{ApiResponse, Meta},
    services::{mapper::order_from_entity, user_service::ensure_user_exists},
    state::AppState,
};

/// One cart line together with the product row it points at, as read inside
/// the checkout transaction.
struct CartLine {
    product: ProductModel,
    quantity: i32,
}

/// Turns the user's cart into an order.
///
/// Every step runs on the same transaction. Any early return drops `txn`
/// uncommitted, so a failed checkout leaves stock, cart and orders untouched.
pub async fn checkout(state: &AppState, payload: CheckoutRequest) -> AppResult<ApiResponse<Order>> {
    payload.validate()?;

    let txn = state.orm.begin().await?;

    ensure_user_exists(&txn, payload.user_id).await?;

    let lines = snapshot_cart(&txn, payload.user_id).await?;
    reserve_stock(&txn, &lines).await?;
    let (order, items) = materialize_order(&txn, &payload, &lines).await?;
    let payment = record_payment(&txn, &order, payload.payment_gateway).await?;

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(payload.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %order.user_id,
        total = %order.total_amount,
        lines = items.len(),
        "checkout completed"
    );

    audit::record(
        &state.orm,
        Some(order.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total": order.total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed",
        order_from_entity(order, items, payment),
        Some(Meta::empty()),
    ))
}

async fn snapshot_cart(txn: &DatabaseTransaction, user_id: Uuid) -> AppResult<Vec<CartLine>> {
    let mut finder = CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .find_also_related(Products)
        .order_by_asc(CartCol::CreatedAt);
    if txn.get_database_backend() == DbBackend::Postgres {
        finder = finder.lock(LockType::Update);
    }

    let rows = finder.all(txn).await?;
    if rows.is_empty() {
        return Err(AppError::bad_request("Cart is empty"));
    }

    rows.into_iter()
        .map(|(line, product)| {
            let product = product.ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("cart line {} has no product", line.id))
            })?;
            Ok(CartLine {
                product,
                quantity: line.quantity,
            })
        })
        .collect()
}

async fn reserve_stock(txn: &DatabaseTransaction, lines: &[CartLine]) -> AppResult<()> {
    let now = Utc::now().fixed_offset();
    for line in lines {
        if line.quantity <= 0 {
            return Err(AppError::bad_request("Invalid quantity in cart"));
        }
        let not_enough = || {
            AppError::bad_request(format!("Not enough stock for product: {}", line.product.name))
        };
        if line.product.stock_quantity < line.quantity {
            return Err(not_enough());
        }

        // Guarded so a concurrent checkout can never push stock below zero.
        let result = Products::update_many()
            .col_expr(
                ProdCol::StockQuantity,
                Expr::col(ProdCol::StockQuantity).sub(line.quantity),
            )
            .col_expr(ProdCol::UpdatedAt, Expr::value(now))
            .filter(ProdCol::Id.eq(line.product.id))
            .filter(ProdCol::StockQuantity.gte(line.quantity))
            .exec(txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(not_enough());
        }
    }
    Ok(())
}

async fn materialize_order(
    txn: &DatabaseTransaction,
    payload: &CheckoutRequest,
    lines: &[CartLine],
) -> AppResult<(OrderModel, Vec<OrderItemModel>)> {
    let total: Decimal = lines
        .iter()
        .map(|line| line.product.price * Decimal::from(line.quantity))
        .sum();

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(payload.user_id),
        total_amount: Set(total),
        order_status: Set(OrderStatus::Processing),
        payment_method: Set(payload.payment_method),
        payment_status: Set(PaymentStatus::Pending),
        shipping_name: Set(payload.shipping_name.trim().to_string()),
        shipping_address: Set(payload.shipping_address.trim().to_string()),
        shipping_phone: Set(payload.shipping_phone.trim().to_string()),
        shipping_email: Set(payload.shipping_email.trim().to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product.id),
            product_name: Set(line.product.name.clone()),
            quantity: Set(line.quantity),
            unit_price: Set(line.product.price),
            created_at: Set(now.into()),
        }
        .insert(txn)
        .await?;
        items.push(item);
    }

    Ok((order, items))
}

async fn record_payment(
    txn: &DatabaseTransaction,
    order: &OrderModel,
    gateway: Option<PaymentGateway>,
) -> AppResult<Option<PaymentModel>> {
    if order.payment_method != PaymentMethod::OnlinePayment {
        return Ok(None);
    }
    let gateway = gateway.ok_or_else(|| {
        AppError::bad_request("Payment gateway is required for online payments")
    })?;

    let now = Utc::now();
    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        gateway: Set(gateway),
        status: Set(PaymentStatus::Pending),
        amount: Set(order.total_amount),
        transaction_reference: Set(None),
        payment_date: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(txn)
    .await?;

    Ok(Some(payment))
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;
    let order = load_order(&state.orm, order).await?;
    Ok(ApiResponse::success("Order", order, None))
}

/// Newest first; restricted to one user when `user_id` is given.
pub async fn list_orders(
    state: &AppState,
    user_id: Option<Uuid>,
) -> AppResult<ApiResponse<OrderList>> {
    let mut finder = Orders::find().order_by_desc(OrderCol::CreatedAt);
    if let Some(user_id) = user_id {
        ensure_user_exists(&state.orm, user_id).await?;
        finder = finder.filter(OrderCol::UserId.eq(user_id));
    }

    let orders = finder.all(&state.orm).await?;
    let items = orders
        .load_many(
            OrderItems::find().order_by_asc(OrderItemCol::CreatedAt),
            &state.orm,
        )
        .await?;
    let payments = orders.load_one(Payments, &state.orm).await?;

    let items: Vec<Order> = orders
        .into_iter()
        .zip(items)
        .zip(payments)
        .map(|((order, items), payment)| order_from_entity(order, items, payment))
        .collect();

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

/// Loads the line items and payment of `order` into its API representation.
pub(crate) async fn load_order<C: ConnectionTrait>(conn: &C, order: OrderModel) -> AppResult<Order> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?;
    let payment = Payments::find()
        .filter(PaymentCol::OrderId.eq(order.id))
        .one(conn)
        .await?;
    Ok(order_from_entity(order, items, payment))
}
