//! Order status transitions.
//!
//! The usual path is `PENDING → PROCESSING → PAID → SHIPPED → DELIVERED`,
//! but an open order may be set to any other open status or to `DELIVERED`.
//! `CANCELLED` is reachable from every open status. `DELIVERED` and
//! `CANCELLED` are terminal.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::OrderStatusUpdateRequest,
    entity::{
        enums::{OrderStatus, PaymentStatus},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Entity as Orders, Model as OrderModel},
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    models::Order,
    response::{ApiResponse, Meta},
    services::order_service::load_order,
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Requested status equals the current one; nothing to do.
    Stay,
    /// Move between open statuses, or into `DELIVERED`.
    Move,
    /// Move to `CANCELLED` and give the reserved stock back.
    Cancel,
    Denied(&'static str),
}

pub fn transition(from: OrderStatus, to: OrderStatus) -> Transition {
    use OrderStatus::*;

    match (from, to) {
        (Cancelled, Cancelled) => Transition::Stay,
        (Cancelled, _) => Transition::Denied("Cancelled orders cannot change status"),
        (Delivered, Delivered) => Transition::Stay,
        (Delivered, _) => Transition::Denied("Delivered orders cannot change status"),
        (Pending | Processing | Paid | Shipped, Cancelled) => Transition::Cancel,
        (Pending, Pending) | (Processing, Processing) | (Paid, Paid) | (Shipped, Shipped) => {
            Transition::Stay
        }
        (Pending | Processing | Paid | Shipped, Pending | Processing | Paid | Shipped | Delivered) => {
            Transition::Move
        }
    }
}

pub async fn update_order_status(
    state: &AppState,
    id: Uuid,
    payload: OrderStatusUpdateRequest,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let mut finder = Orders::find_by_id(id);
    if txn.get_database_backend() == DbBackend::Postgres {
        finder = finder.lock(LockType::Update);
    }
    let order = finder
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let from = order.order_status;
    let to = payload.order_status;
    match transition(from, to) {
        Transition::Denied(reason) => return Err(AppError::bad_request(reason)),
        Transition::Cancel => restore_stock(&txn, &order).await?,
        Transition::Stay | Transition::Move => {}
    }

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.order_status = Set(to);
    if let Some(payment_status) = payload.payment_status {
        active.payment_status = Set(payment_status);
        sync_payment(&txn, id, payment_status).await?;
    }
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;

    let order = load_order(&txn, order).await?;
    txn.commit().await?;

    if from != to {
        tracing::info!(order_id = %id, from = ?from, to = ?to, "order status changed");
    }

    audit::record(
        &state.orm,
        Some(order.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": id, "from": from, "to": to }),
    )
    .await;

    Ok(ApiResponse::success("Updated", order, Some(Meta::empty())))
}

/// Adds every item quantity of `order` back to its product.
async fn restore_stock<C: ConnectionTrait>(conn: &C, order: &OrderModel) -> AppResult<()> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(conn)
        .await?;

    let now = Utc::now().fixed_offset();
    for item in &items {
        Products::update_many()
            .col_expr(
                ProdCol::StockQuantity,
                Expr::col(ProdCol::StockQuantity).add(item.quantity),
            )
            .col_expr(ProdCol::UpdatedAt, Expr::value(now))
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(conn)
            .await?;
    }

    tracing::info!(order_id = %order.id, lines = items.len(), "stock restored for cancelled order");
    Ok(())
}

async fn sync_payment<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    status: PaymentStatus,
) -> AppResult<()> {
    let Some(payment) = Payments::find()
        .filter(PaymentCol::OrderId.eq(order_id))
        .one(conn)
        .await?
    else {
        return Ok(());
    };

    let now = Utc::now();
    let becomes_successful = status == PaymentStatus::Success && payment.status != PaymentStatus::Success;
    let mut active: PaymentActive = payment.into();
    active.status = Set(status);
    if becomes_successful {
        active.payment_date = Set(Some(now.into()));
    }
    active.updated_at = Set(now.into());
    active.update(conn).await?;
    Ok(())
}
