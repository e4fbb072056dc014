use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{entity::enums::UserRole, models::User};

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100), custom(function = "crate::dto::not_blank"))]
    pub full_name: String,
    #[validate(email, length(max = 100))]
    pub email: String,
    #[validate(length(min = 6, max = 255))]
    pub password: String,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct UserList {
    #[schema(value_type = Vec<User>)]
    pub items: Vec<User>,
}
