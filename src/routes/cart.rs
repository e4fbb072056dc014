use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::cart::{CartItemRequest, CartList},
    error::AppResult,
    models::CartItem,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

/// Mounted under `/users/{id}/cart`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).post(add_item).delete(clear_cart))
        .route("/{cart_item_id}", put(update_item).delete(remove_item))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/cart",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Cart lines priced at current product prices", body = ApiResponse<CartList>),
        (status = 404, description = "User not found"),
    ),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartList>>> {
    Ok(Json(cart_service::get_cart(&state, user_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/cart",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = CartItemRequest,
    responses(
        (status = 201, description = "Line created or merged", body = ApiResponse<CartItem>),
        (status = 400, description = "Out of stock or invalid quantity"),
        (status = 404, description = "User or product not found"),
    ),
    tag = "Cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<CartItemRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CartItem>>)> {
    let response = cart_service::add_item(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/cart/{cart_item_id}",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("cart_item_id" = Uuid, Path, description = "Cart line ID"),
    ),
    request_body = CartItemRequest,
    responses(
        (status = 200, description = "Line updated", body = ApiResponse<CartItem>),
        (status = 400, description = "Out of stock or invalid quantity"),
        (status = 404, description = "Cart line or product not found"),
    ),
    tag = "Cart"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path((user_id, cart_item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CartItemRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    Ok(Json(
        cart_service::update_item(&state, user_id, cart_item_id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/cart/{cart_item_id}",
    params(
        ("id" = Uuid, Path, description = "User ID"),
        ("cart_item_id" = Uuid, Path, description = "Cart line ID"),
    ),
    responses(
        (status = 204, description = "Line removed"),
        (status = 404, description = "Cart line not found"),
    ),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    Path((user_id, cart_item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    cart_service::remove_item(&state, user_id, cart_item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/cart",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Cart emptied"),
        (status = 404, description = "User not found"),
    ),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    cart_service::clear_cart(&state, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
