use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
    sea_query::{Expr, Func},
};
use shop_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{categories, enums::UserRole, products, users},
    services::password::{Argon2Encoder, PasswordEncoder},
};
use uuid::Uuid;

const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x200";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url, config.db_max_connections).await?;
    run_migrations(&orm).await?;

    let user_id = ensure_client(&orm, "client@myshop.test", "password").await?;
    let category_id = ensure_category(&orm, "Electronique", "Appareils et accessoires").await?;
    seed_products(&orm, category_id).await?;

    println!("Seed completed. Client ID: {user_id}, Category ID: {category_id}");
    Ok(())
}

async fn ensure_client(
    orm: &DatabaseConnection,
    email: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("User {email} already present");
        return Ok(existing.id);
    }

    let now = Utc::now();
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        full_name: Set("Client Test".to_string()),
        email: Set(email.to_string()),
        password_hash: Set(Argon2Encoder.encode(password)?),
        phone_number: Set(Some("0600000000".to_string())),
        address: Set(Some("Adresse de test".to_string())),
        role: Set(UserRole::Client),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(orm)
    .await?;

    println!("Created user {email} (role=CLIENT)");
    Ok(user.id)
}

async fn ensure_category(
    orm: &DatabaseConnection,
    name: &str,
    description: &str,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = categories::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(categories::Column::Name))).eq(name.to_lowercase()))
        .one(orm)
        .await?
    {
        return Ok(existing.id);
    }

    let now = Utc::now();
    let category = categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(Some(description.to_string())),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(orm)
    .await?;

    println!("Created category {name}");
    Ok(category.id)
}

/// Only seeds when the category is still empty.
async fn seed_products(orm: &DatabaseConnection, category_id: Uuid) -> anyhow::Result<()> {
    let existing = products::Entity::find()
        .filter(products::Column::CategoryId.eq(category_id))
        .count(orm)
        .await?;
    if existing > 0 {
        println!("Products already seeded");
        return Ok(());
    }

    let catalogue = [
        ("Laptop 14", "Portable 14 pouces", "8999.00", 10),
        ("Casque Bluetooth", "Casque sans fil", "599.00", 25),
    ];

    for (name, description, price, stock) in catalogue {
        let now = Utc::now();
        products::ActiveModel {
            id: Set(Uuid::new_v4()),
            category_id: Set(category_id),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            price: Set(Decimal::from_str(price)?),
            stock_quantity: Set(stock),
            image_url: Set(Some(PLACEHOLDER_IMAGE.to_string())),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
