mod common;

use common::{
    add_to_cart, checkout_request, create_category, create_product, create_user, dec,
    product_request, setup_state, unique,
};
use shop_api::{
    dto::{categories::CategoryRequest, reviews::ReviewRequest},
    entity::enums::PaymentMethod,
    error::AppError,
    routes::params::ProductSearch,
    services::{cart_service, category_service, order_service, product_service, review_service},
};
use uuid::Uuid;

fn search(category_id: Uuid, extra: &[(&str, &str)]) -> ProductSearch {
    let mut pairs = vec![("categoryId".to_string(), category_id.to_string())];
    pairs.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    ProductSearch::from_pairs(pairs).unwrap()
}

#[tokio::test]
async fn category_names_are_unique_ignoring_case() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let name = unique("Maison");
    let created = category_service::create_category(
        &state,
        CategoryRequest { name: name.clone(), description: None },
    )
    .await?
    .data
    .unwrap();

    let err = category_service::create_category(
        &state,
        CategoryRequest { name: name.to_uppercase(), description: None },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Category name already exists");

    // Re-saving under a different casing of its own name is allowed.
    let renamed = category_service::update_category(
        &state,
        created.id,
        CategoryRequest {
            name: name.to_uppercase(),
            description: Some("Tout pour la maison".to_string()),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(renamed.name, name.to_uppercase());

    let other = create_category(&state).await?;
    let err = category_service::update_category(
        &state,
        other.id,
        CategoryRequest { name: name.clone(), description: None },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    Ok(())
}

#[tokio::test]
async fn category_with_products_cannot_be_deleted() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let category = create_category(&state).await?;
    let product = create_product(&state, category.id, "Lampe", "45.00", 3).await?;

    let err = category_service::delete_category(&state, category.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot delete category with products");

    product_service::delete_product(&state, product.id).await?;
    category_service::delete_category(&state, category.id).await?;

    let err = category_service::get_category(&state, category.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Category not found");
    Ok(())
}

#[tokio::test]
async fn product_validation_rules() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let category = create_category(&state).await?;

    let err = product_service::create_product(&state, product_request(category.id, "Gratuit", "0", 1))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Price must be greater than zero");

    let err =
        product_service::create_product(&state, product_request(category.id, "Negatif", "10", -1))
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err =
        product_service::create_product(&state, product_request(Uuid::new_v4(), "Orphelin", "10", 1))
            .await
            .unwrap_err();
    assert_eq!(err.to_string(), "Category not found");

    let product = create_product(&state, category.id, "Tapis", "60.00", 2).await?;
    let moved_to = create_category(&state).await?;
    let updated = product_service::update_product(
        &state,
        product.id,
        product_request(moved_to.id, "Tapis XL", "75.50", 9),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.name, "Tapis XL");
    assert_eq!(updated.price, dec("75.50"));
    assert_eq!(updated.stock_quantity, 9);
    assert_eq!(updated.category.id, moved_to.id);

    let err = product_service::update_product(
        &state,
        Uuid::new_v4(),
        product_request(moved_to.id, "Fantome", "1.00", 1),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Product not found");
    Ok(())
}

#[tokio::test]
async fn ordered_product_cannot_be_deleted() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state).await?;
    let category = create_category(&state).await?;
    let product = create_product(&state, category.id, "Imprimante", "900.00", 4).await?;
    add_to_cart(&state, user.id, product.id, 1).await?;
    order_service::checkout(
        &state,
        checkout_request(user.id, PaymentMethod::CashOnDelivery, None),
    )
    .await?;

    let err = product_service::delete_product(&state, product.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot delete product linked to an order");
    assert!(product_service::get_product(&state, product.id).await.is_ok());
    Ok(())
}

#[tokio::test]
async fn deleting_a_product_drops_its_cart_lines_and_reviews() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state).await?;
    let category = create_category(&state).await?;
    let product = create_product(&state, category.id, "Scanner", "320.00", 3).await?;
    add_to_cart(&state, user.id, product.id, 1).await?;
    review_service::create_review(
        &state,
        ReviewRequest {
            product_id: product.id,
            user_id: user.id,
            rating: 4,
            comment: "Rapide".to_string(),
        },
    )
    .await?;

    product_service::delete_product(&state, product.id).await?;

    let cart = cart_service::get_cart(&state, user.id).await?.data.unwrap();
    assert!(cart.items.is_empty());
    let reviews = review_service::list_reviews_for_product(&state, product.id)
        .await?
        .data
        .unwrap();
    assert!(reviews.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn search_filters_compose() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let category = create_category(&state).await?;
    let other = create_category(&state).await?;
    create_product(&state, category.id, "Laptop 14", "8999.00", 10).await?;
    create_product(&state, category.id, "Laptop 16 Pro", "12999.00", 3).await?;
    create_product(&state, category.id, "Casque Bluetooth", "599.00", 25).await?;
    create_product(&state, other.id, "Laptop Stand", "199.00", 40).await?;

    let names = |response: shop_api::response::ApiResponse<shop_api::dto::products::ProductList>| {
        response
            .data
            .unwrap()
            .items
            .into_iter()
            .map(|p| p.name)
            .collect::<Vec<_>>()
    };

    let found = product_service::search_products(&state, search(category.id, &[("search", "  LAPTOP ")]))
        .await?;
    assert_eq!(found.meta.as_ref().unwrap().total, Some(2));
    let mut found = names(found);
    found.sort();
    assert_eq!(found, vec!["Laptop 14", "Laptop 16 Pro"]);

    let found = product_service::search_products(
        &state,
        search(category.id, &[("minPrice", "500"), ("maxPrice", "9000"), ("sort", "price,desc")]),
    )
    .await?;
    assert_eq!(names(found), vec!["Laptop 14", "Casque Bluetooth"]);

    let found = product_service::search_products(
        &state,
        search(category.id, &[("search", "   "), ("sort", "name")]),
    )
    .await?;
    assert_eq!(
        names(found),
        vec!["Casque Bluetooth", "Laptop 14", "Laptop 16 Pro"]
    );
    Ok(())
}

#[tokio::test]
async fn search_paginates_when_asked() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let category = create_category(&state).await?;
    for (name, price) in [("A", "10.00"), ("B", "20.00"), ("C", "30.00"), ("D", "40.00"), ("E", "50.00")] {
        create_product(&state, category.id, name, price, 1).await?;
    }

    let page = product_service::search_products(
        &state,
        search(category.id, &[("sort", "price,asc"), ("page", "2"), ("perPage", "2")]),
    )
    .await?;
    let meta = page.meta.clone().unwrap();
    assert_eq!(meta.page, Some(2));
    assert_eq!(meta.per_page, Some(2));
    assert_eq!(meta.total, Some(5));
    let prices: Vec<_> = page.data.unwrap().items.into_iter().map(|p| p.price).collect();
    assert_eq!(prices, vec![dec("30.00"), dec("40.00")]);

    let all = product_service::search_products(&state, search(category.id, &[])).await?;
    assert_eq!(all.meta.unwrap().page, None);
    assert_eq!(all.data.unwrap().items.len(), 5);
    Ok(())
}

#[tokio::test]
async fn product_carries_its_category() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let category = create_category(&state).await?;
    let product = create_product(&state, category.id, "Routeur Wifi", "349.00", 7).await?;

    let fetched = product_service::get_product(&state, product.id).await?.data.unwrap();
    assert_eq!(fetched.category.id, category.id);
    assert_eq!(fetched.category.name, category.name);

    let err = product_service::get_product(&state, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    Ok(())
}
