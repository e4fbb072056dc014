use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::services::{payment_service::PaymentIntentGateway, password::PasswordEncoder};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub passwords: Arc<dyn PasswordEncoder>,
    pub payments: Arc<dyn PaymentIntentGateway>,
}
