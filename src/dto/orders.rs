use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entity::enums::{OrderStatus, PaymentGateway, PaymentMethod, PaymentStatus},
    models::Order,
};

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 150), custom(function = "crate::dto::not_blank"))]
    pub shipping_name: String,
    #[validate(length(min = 1, max = 255), custom(function = "crate::dto::not_blank"))]
    pub shipping_address: String,
    #[validate(length(min = 1, max = 20), custom(function = "crate::dto::not_blank"))]
    pub shipping_phone: String,
    #[validate(email, length(max = 100))]
    pub shipping_email: String,
    pub payment_method: PaymentMethod,
    pub payment_gateway: Option<PaymentGateway>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusUpdateRequest {
    pub order_status: OrderStatus,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Order>)]
    pub items: Vec<Order>,
}
