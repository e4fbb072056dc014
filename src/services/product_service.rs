use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, ModelTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Func, SimpleExpr},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::products::{ProductList, ProductRequest},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        categories::{Entity as Categories, Model as CategoryModel},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
        reviews::{Column as ReviewCol, Entity as Reviews},
    },
    error::{AppError, AppResult},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductSearch, ProductSortBy, SortOrder},
    services::{category_service::ensure_category_exists, mapper::product_from_entity},
    state::AppState,
};

pub async fn search_products(
    state: &AppState,
    query: ProductSearch,
) -> AppResult<ApiResponse<ProductList>> {
    let mut condition = Condition::all();

    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        condition = condition.add(lower_name().like(pattern));
    }

    let mut finder = Products::find()
        .find_also_related(Categories)
        .filter(condition);

    if query.sort.is_empty() {
        finder = finder.order_by_asc(Column::CreatedAt);
    }
    for key in &query.sort {
        let order = match key.order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };
        finder = match key.field {
            ProductSortBy::Price => finder.order_by(Column::Price, order),
            ProductSortBy::CreatedAt => finder.order_by(Column::CreatedAt, order),
            ProductSortBy::Name => finder.order_by(SimpleExpr::from(Func::lower(name_col())), order),
        };
    }

    let total = finder.clone().count(&state.orm).await? as i64;

    let meta = match query.pagination.normalize() {
        Some((page, per_page, offset)) => {
            finder = finder.limit(per_page as u64).offset(offset as u64);
            Meta::new(page, per_page, total)
        }
        None => Meta::total(total),
    };

    let items = finder
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(product, category)| with_category(product, category))
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let (product, category) = Products::find_by_id(id)
        .find_also_related(Categories)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    Ok(ApiResponse::success(
        "Product",
        with_category(product, category)?,
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    payload: ProductRequest,
) -> AppResult<ApiResponse<Product>> {
    payload.validate()?;
    validate_price_and_stock(payload.price, payload.stock_quantity)?;
    let category = ensure_category_exists(&state.orm, payload.category_id).await?;

    let now = Utc::now();
    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        category_id: Set(category.id),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        price: Set(payload.price),
        stock_quantity: Set(payload.stock_quantity),
        image_url: Set(payload.image_url),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        None,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product, category),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    id: Uuid,
    payload: ProductRequest,
) -> AppResult<ApiResponse<Product>> {
    payload.validate()?;
    validate_price_and_stock(payload.price, payload.stock_quantity)?;
    let existing = ensure_product_exists(&state.orm, id).await?;
    let category = ensure_category_exists(&state.orm, payload.category_id).await?;

    let mut active: ActiveModel = existing.into();
    active.category_id = Set(category.id);
    active.name = Set(payload.name.trim().to_string());
    active.description = Set(payload.description);
    active.price = Set(payload.price);
    active.stock_quantity = Set(payload.stock_quantity);
    active.image_url = Set(payload.image_url);
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        None,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product, category),
        Some(Meta::empty()),
    ))
}

/// Deletes a product that was never ordered, together with the cart lines
/// and reviews pointing at it.
pub async fn delete_product(state: &AppState, id: Uuid) -> AppResult<()> {
    let txn = state.orm.begin().await?;

    let product = ensure_product_exists(&txn, id).await?;

    let ordered = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(id))
        .count(&txn)
        .await?;
    if ordered > 0 {
        return Err(AppError::bad_request(
            "Cannot delete product linked to an order",
        ));
    }

    CartItems::delete_many()
        .filter(CartCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    Reviews::delete_many()
        .filter(ReviewCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    product.delete(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.orm,
        None,
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(())
}

pub async fn ensure_product_exists<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))
}

fn validate_price_and_stock(price: Decimal, stock_quantity: i32) -> AppResult<()> {
    if price <= Decimal::ZERO {
        return Err(AppError::bad_request("Price must be greater than zero"));
    }
    if stock_quantity < 0 {
        return Err(AppError::bad_request("Stock quantity must be positive"));
    }
    Ok(())
}

fn name_col() -> Expr {
    Expr::col((Products, Column::Name))
}

fn lower_name() -> Expr {
    Expr::expr(Func::lower(name_col()))
}

fn with_category(product: ProductModel, category: Option<CategoryModel>) -> AppResult<Product> {
    let category = category.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("product {} has no category", product.id))
    })?;
    Ok(product_from_entity(product, category))
}
