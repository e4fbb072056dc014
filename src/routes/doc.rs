use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{CartItemRequest, CartList},
        categories::{CategoryList, CategoryRequest},
        orders::{CheckoutRequest, OrderList, OrderStatusUpdateRequest},
        payments::PaymentIntentRequest,
        products::{ProductList, ProductRequest},
        reviews::{ReviewList, ReviewRequest},
        users::{CreateUserRequest, UserList},
    },
    entity::enums::{OrderStatus, PaymentGateway, PaymentMethod, PaymentStatus, UserRole},
    models::{CartItem, Category, Order, OrderItem, Payment, PaymentIntent, Product, Review, User},
    response::{ApiResponse, Meta},
    routes::{cart, categories, health, orders, payments, products, reviews, users},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::create_user,
        users::get_user,
        users::list_users,
        categories::create_category,
        categories::list_categories,
        categories::get_category,
        categories::update_category,
        categories::delete_category,
        products::search_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::get_cart,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        cart::clear_cart,
        orders::checkout,
        orders::list_orders,
        orders::get_order,
        orders::update_order_status,
        reviews::create_review,
        reviews::list_reviews_for_product,
        reviews::delete_review,
        payments::create_payment_intent
    ),
    components(
        schemas(
            User,
            Category,
            Product,
            CartItem,
            Order,
            OrderItem,
            Payment,
            PaymentIntent,
            Review,
            UserRole,
            OrderStatus,
            PaymentStatus,
            PaymentMethod,
            PaymentGateway,
            CreateUserRequest,
            CategoryRequest,
            ProductRequest,
            CartItemRequest,
            CheckoutRequest,
            OrderStatusUpdateRequest,
            ReviewRequest,
            PaymentIntentRequest,
            UserList,
            CategoryList,
            ProductList,
            CartList,
            OrderList,
            ReviewList,
            Meta,
            ApiResponse<User>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Order>,
            ApiResponse<OrderList>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Users", description = "User endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Products", description = "Product catalogue and search"),
        (name = "Cart", description = "Per-user cart endpoints"),
        (name = "Orders", description = "Checkout and order lifecycle"),
        (name = "Reviews", description = "Product review endpoints"),
        (name = "Payments", description = "Payment intent endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
