use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
    sea_query::{Expr, Func},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::categories::{CategoryList, CategoryRequest},
    entity::{
        categories::{ActiveModel, Column, Entity as Categories, Model as CategoryModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    models::Category,
    response::{ApiResponse, Meta},
    services::mapper::category_from_entity,
    state::AppState,
};

pub async fn create_category(
    state: &AppState,
    payload: CategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    payload.validate()?;
    let name = payload.name.trim().to_string();
    if name_taken(&state.orm, &name).await? {
        return Err(AppError::bad_request("Category name already exists"));
    }

    let now = Utc::now();
    let category = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        None,
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category created",
        category_from_entity(category),
        Some(Meta::empty()),
    ))
}

pub async fn update_category(
    state: &AppState,
    id: Uuid,
    payload: CategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    payload.validate()?;
    let existing = ensure_category_exists(&state.orm, id).await?;
    let name = payload.name.trim().to_string();

    if existing.name.to_lowercase() != name.to_lowercase()
        && name_taken(&state.orm, &name).await?
    {
        return Err(AppError::bad_request("Category name already exists"));
    }

    let mut active: ActiveModel = existing.into();
    active.name = Set(name);
    active.description = Set(payload.description);
    active.updated_at = Set(Utc::now().into());
    let category = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        None,
        "category_update",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        category_from_entity(category),
        Some(Meta::empty()),
    ))
}

pub async fn delete_category(state: &AppState, id: Uuid) -> AppResult<()> {
    let category = ensure_category_exists(&state.orm, id).await?;

    let owned = Products::find()
        .filter(ProdCol::CategoryId.eq(id))
        .count(&state.orm)
        .await?;
    if owned > 0 {
        return Err(AppError::bad_request("Cannot delete category with products"));
    }

    category.delete(&state.orm).await?;

    audit::record(
        &state.orm,
        None,
        "category_delete",
        "categories",
        serde_json::json!({ "category_id": id }),
    )
    .await;

    Ok(())
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Category>> {
    let category = ensure_category_exists(&state.orm, id).await?;
    Ok(ApiResponse::success(
        "Category",
        category_from_entity(category),
        None,
    ))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items: Vec<Category> = Categories::find()
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(meta),
    ))
}

pub async fn ensure_category_exists<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<CategoryModel> {
    Categories::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))
}

async fn name_taken<C: ConnectionTrait>(conn: &C, name: &str) -> AppResult<bool> {
    let count = Categories::find()
        .filter(Expr::expr(Func::lower(Expr::col(Column::Name))).eq(name.to_lowercase()))
        .count(conn)
        .await?;
    Ok(count > 0)
}
