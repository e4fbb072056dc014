#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use shop_api::{
    db::{create_orm_conn, run_migrations},
    dto::{
        cart::CartItemRequest, categories::CategoryRequest, orders::CheckoutRequest,
        products::ProductRequest, users::CreateUserRequest,
    },
    entity::enums::{PaymentGateway, PaymentMethod, UserRole},
    models::{Category, PaymentIntent, Product, User},
    services::{
        cart_service, category_service, password::Argon2Encoder,
        payment_service::PaymentIntentGateway, product_service, user_service,
    },
    state::AppState,
};
use uuid::Uuid;

/// Records every call and answers with a canned intent.
#[derive(Default)]
pub struct FakeGateway {
    pub calls: Mutex<Vec<(i64, String)>>,
    pub fail: bool,
}

#[async_trait]
impl PaymentIntentGateway for FakeGateway {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> anyhow::Result<PaymentIntent> {
        if self.fail {
            anyhow::bail!("gateway unavailable");
        }
        self.calls
            .lock()
            .unwrap()
            .push((amount_minor, currency.to_string()));
        Ok(PaymentIntent {
            id: "pi_test".to_string(),
            client_secret: Some("pi_test_secret".to_string()),
            amount: amount_minor,
            currency: currency.to_string(),
            status: "requires_payment_method".to_string(),
        })
    }

    fn default_currency(&self) -> &str {
        "mad"
    }
}

pub async fn setup_state() -> anyhow::Result<AppState> {
    setup_state_with(Arc::new(FakeGateway::default())).await
}

/// Fresh schema on an in-memory SQLite database unless `TEST_DATABASE_URL`
/// points somewhere else.
pub async fn setup_state_with(payments: Arc<dyn PaymentIntentGateway>) -> anyhow::Result<AppState> {
    let database_url =
        std::env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let orm = create_orm_conn(&database_url, 5).await?;
    run_migrations(&orm).await?;
    Ok(AppState {
        orm,
        passwords: Arc::new(Argon2Encoder),
        payments,
    })
}

pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..8])
}

pub fn dec(raw: &str) -> Decimal {
    raw.parse().unwrap()
}

pub async fn create_user(state: &AppState) -> anyhow::Result<User> {
    let email = format!("{}@myshop.test", unique("client"));
    let response = user_service::create_user(
        state,
        CreateUserRequest {
            full_name: "Client Test".to_string(),
            email,
            password: "password".to_string(),
            phone_number: Some("0600000000".to_string()),
            address: Some("Adresse de test".to_string()),
            role: UserRole::Client,
        },
    )
    .await?;
    Ok(response.data.unwrap())
}

pub async fn create_category(state: &AppState) -> anyhow::Result<Category> {
    let response = category_service::create_category(
        state,
        CategoryRequest {
            name: unique("category"),
            description: None,
        },
    )
    .await?;
    Ok(response.data.unwrap())
}

pub fn product_request(category_id: Uuid, name: &str, price: &str, stock: i32) -> ProductRequest {
    ProductRequest {
        category_id,
        name: name.to_string(),
        description: None,
        price: dec(price),
        stock_quantity: stock,
        image_url: None,
    }
}

pub async fn create_product(
    state: &AppState,
    category_id: Uuid,
    name: &str,
    price: &str,
    stock: i32,
) -> anyhow::Result<Product> {
    let response =
        product_service::create_product(state, product_request(category_id, name, price, stock))
            .await?;
    Ok(response.data.unwrap())
}

pub async fn add_to_cart(
    state: &AppState,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> anyhow::Result<()> {
    cart_service::add_item(
        state,
        user_id,
        CartItemRequest {
            product_id,
            quantity,
        },
    )
    .await?;
    Ok(())
}

pub fn checkout_request(
    user_id: Uuid,
    payment_method: PaymentMethod,
    payment_gateway: Option<PaymentGateway>,
) -> CheckoutRequest {
    CheckoutRequest {
        user_id,
        shipping_name: "Client Test".to_string(),
        shipping_address: "12 rue des Tests, Casablanca".to_string(),
        shipping_phone: "0600000000".to_string(),
        shipping_email: "client@myshop.test".to_string(),
        payment_method,
        payment_gateway,
    }
}

pub async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let response = product_service::get_product(state, product_id).await?;
    Ok(response.data.unwrap().stock_quantity)
}
