use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::users::{CreateUserRequest, UserList},
    entity::users::{ActiveModel, Column, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    models::User,
    response::{ApiResponse, Meta},
    services::mapper::user_from_entity,
    state::AppState,
};

pub async fn create_user(
    state: &AppState,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<User>> {
    payload.validate()?;
    let email = payload.email.trim().to_string();

    let taken = Users::find()
        .filter(Column::Email.eq(email.as_str()))
        .count(&state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::bad_request("Email already exists"));
    }

    let password_hash = state.passwords.encode(&payload.password)?;
    let now = Utc::now();
    let user = ActiveModel {
        id: Set(Uuid::new_v4()),
        full_name: Set(payload.full_name.trim().to_string()),
        email: Set(email),
        password_hash: Set(password_hash),
        phone_number: Set(payload.phone_number),
        address: Set(payload.address),
        role: Set(payload.role),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.id),
        "user_create",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created",
        user_from_entity(user),
        Some(Meta::empty()),
    ))
}

pub async fn get_user(state: &AppState, id: Uuid) -> AppResult<ApiResponse<User>> {
    let user = ensure_user_exists(&state.orm, id).await?;
    Ok(ApiResponse::success("User", user_from_entity(user), None))
}

pub async fn list_users(state: &AppState) -> AppResult<ApiResponse<UserList>> {
    let items: Vec<User> = Users::find()
        .order_by_asc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(user_from_entity)
        .collect();

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

/// Loads a user or fails with 404; usable inside a transaction.
pub async fn ensure_user_exists<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}
