use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::reviews::{ReviewList, ReviewRequest},
    entity::reviews::{ActiveModel, Column, Entity as Reviews},
    error::{AppError, AppResult},
    models::Review,
    response::{ApiResponse, Meta},
    services::{
        mapper::review_from_entity, product_service::ensure_product_exists,
        user_service::ensure_user_exists,
    },
    state::AppState,
};

pub async fn create_review(
    state: &AppState,
    payload: ReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    payload.validate()?;
    let product = ensure_product_exists(&state.orm, payload.product_id).await?;
    let user = ensure_user_exists(&state.orm, payload.user_id).await?;

    let review = ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        user_id: Set(user.id),
        rating: Set(payload.rating),
        comment: Set(payload.comment.trim().to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.id),
        "review_create",
        "reviews",
        serde_json::json!({ "review_id": review.id, "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review created",
        review_from_entity(review),
        Some(Meta::empty()),
    ))
}

/// Newest first. An unknown product simply has no reviews.
pub async fn list_reviews_for_product(
    state: &AppState,
    product_id: Uuid,
) -> AppResult<ApiResponse<ReviewList>> {
    let items: Vec<Review> = Reviews::find()
        .filter(Column::ProductId.eq(product_id))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Reviews", ReviewList { items }, Some(meta)))
}

pub async fn delete_review(state: &AppState, id: Uuid) -> AppResult<()> {
    let review = Reviews::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Review"))?;
    let user_id = review.user_id;
    review.delete(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user_id),
        "review_delete",
        "reviews",
        serde_json::json!({ "review_id": id }),
    )
    .await;

    Ok(())
}
