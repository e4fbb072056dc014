use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{CartItemRequest, CartList},
    entity::{
        cart_items::{ActiveModel, Column, Entity as CartItems, Model as CartItemModel},
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    models::CartItem,
    response::{ApiResponse, Meta},
    services::{
        mapper::cart_item_from_entity, product_service::ensure_product_exists,
        user_service::ensure_user_exists,
    },
    state::AppState,
};

pub async fn get_cart(state: &AppState, user_id: Uuid) -> AppResult<ApiResponse<CartList>> {
    ensure_user_exists(&state.orm, user_id).await?;

    let rows = CartItems::find()
        .filter(Column::UserId.eq(user_id))
        .find_also_related(Products)
        .order_by_asc(Column::CreatedAt)
        .all(&state.orm)
        .await?;

    let items = rows
        .into_iter()
        .map(|(line, product)| {
            let product = product.ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("cart line {} has no product", line.id))
            })?;
            Ok(cart_item_from_entity(line, &product))
        })
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Cart", CartList { items }, Some(meta)))
}

/// Adds a product to the cart, merging with an existing line for the same
/// product. The merged quantity is checked against current stock.
pub async fn add_item(
    state: &AppState,
    user_id: Uuid,
    payload: CartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    ensure_user_exists(&state.orm, user_id).await?;
    let product = ensure_product_exists(&state.orm, payload.product_id).await?;

    let line = match find_line(&state.orm, user_id, product.id).await? {
        Some(line) => merge_into_line(&state.orm, line, &product, payload.quantity).await?,
        None => {
            check_quantity(&product, payload.quantity, payload.quantity)?;
            let now = Utc::now();
            let inserted = ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                product_id: Set(product.id),
                quantity: Set(payload.quantity),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
            .insert(&state.orm)
            .await;

            match inserted {
                Ok(line) => line,
                // Another request created the line between our lookup and insert.
                Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    let line = find_line(&state.orm, user_id, product.id)
                        .await?
                        .ok_or(AppError::OrmError(err))?;
                    merge_into_line(&state.orm, line, &product, payload.quantity).await?
                }
                Err(err) => return Err(err.into()),
            }
        }
    };

    audit::record(
        &state.orm,
        Some(user_id),
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": product.id, "quantity": line.quantity }),
    )
    .await;

    Ok(ApiResponse::success(
        "Added to cart",
        cart_item_from_entity(line, &product),
        Some(Meta::empty()),
    ))
}

pub async fn update_item(
    state: &AppState,
    user_id: Uuid,
    item_id: Uuid,
    payload: CartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    ensure_user_exists(&state.orm, user_id).await?;

    let line = CartItems::find_by_id(item_id)
        .filter(Column::UserId.eq(user_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Cart item"))?;
    let product = ensure_product_exists(&state.orm, payload.product_id).await?;

    if line.product_id != product.id {
        let clash = CartItems::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::ProductId.eq(product.id))
            .one(&state.orm)
            .await?;
        if clash.is_some() {
            return Err(AppError::bad_request("Product is already in the cart"));
        }
    }

    check_quantity(&product, payload.quantity, payload.quantity)?;

    let mut active: ActiveModel = line.into();
    active.product_id = Set(product.id);
    active.quantity = Set(payload.quantity);
    active.updated_at = Set(Utc::now().into());
    let line = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user_id),
        "cart_update",
        "cart_items",
        serde_json::json!({ "cart_item_id": line.id, "quantity": line.quantity }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        cart_item_from_entity(line, &product),
        Some(Meta::empty()),
    ))
}

pub async fn remove_item(state: &AppState, user_id: Uuid, item_id: Uuid) -> AppResult<()> {
    let result = CartItems::delete_many()
        .filter(Column::Id.eq(item_id))
        .filter(Column::UserId.eq(user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Cart item"));
    }

    audit::record(
        &state.orm,
        Some(user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "cart_item_id": item_id }),
    )
    .await;

    Ok(())
}

pub async fn clear_cart(state: &AppState, user_id: Uuid) -> AppResult<()> {
    ensure_user_exists(&state.orm, user_id).await?;

    let result = CartItems::delete_many()
        .filter(Column::UserId.eq(user_id))
        .exec(&state.orm)
        .await?;

    audit::record(
        &state.orm,
        Some(user_id),
        "cart_clear",
        "cart_items",
        serde_json::json!({ "removed": result.rows_affected }),
    )
    .await;

    Ok(())
}

async fn find_line<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    product_id: Uuid,
) -> AppResult<Option<CartItemModel>> {
    Ok(CartItems::find()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::ProductId.eq(product_id))
        .one(conn)
        .await?)
}

/// Adds `quantity` to an existing line. The increment is applied in SQL and
/// guarded on stock, so concurrent merges cannot overshoot it.
async fn merge_into_line<C: ConnectionTrait>(
    conn: &C,
    line: CartItemModel,
    product: &ProductModel,
    quantity: i32,
) -> AppResult<CartItemModel> {
    let total = line
        .quantity
        .checked_add(quantity)
        .ok_or_else(|| AppError::bad_request("Requested quantity exceeds stock"))?;
    check_quantity(product, quantity, total)?;

    let result = CartItems::update_many()
        .col_expr(Column::Quantity, Expr::col(Column::Quantity).add(quantity))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
        .filter(Column::Id.eq(line.id))
        .filter(Column::Quantity.lte(product.stock_quantity - quantity))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::bad_request("Requested quantity exceeds stock"));
    }

    CartItems::find_by_id(line.id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Cart item"))
}

/// `requested` is what the caller sent, `total` the quantity the line will hold.
fn check_quantity(product: &ProductModel, requested: i32, total: i32) -> AppResult<()> {
    if product.stock_quantity <= 0 {
        return Err(AppError::bad_request("Product is out of stock"));
    }
    if requested <= 0 {
        return Err(AppError::bad_request("Quantity must be greater than zero"));
    }
    if total > product.stock_quantity {
        return Err(AppError::bad_request("Requested quantity exceeds stock"));
    }
    Ok(())
}
