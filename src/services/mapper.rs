use chrono::Utc;
use rust_decimal::Decimal;

use crate::{
    entity::{
        categories::Model as CategoryModel, order_items::Model as OrderItemModel,
        orders::Model as OrderModel, payments::Model as PaymentModel,
        products::Model as ProductModel, reviews::Model as ReviewModel,
        users::Model as UserModel,
    },
    models::{Category, CartItem, Order, OrderItem, Payment, Product, Review, User},
};

pub fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        full_name: model.full_name,
        email: model.email,
        phone_number: model.phone_number,
        address: model.address,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        description: model.description,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn product_from_entity(model: ProductModel, category: CategoryModel) -> Product {
    Product {
        id: model.id,
        category: category_from_entity(category),
        name: model.name,
        description: model.description,
        price: model.price,
        stock_quantity: model.stock_quantity,
        image_url: model.image_url,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn cart_item_from_entity(
    model: crate::entity::cart_items::Model,
    product: &ProductModel,
) -> CartItem {
    CartItem {
        id: model.id,
        product_id: product.id,
        product_name: product.name.clone(),
        image_url: product.image_url.clone(),
        unit_price: product.price,
        quantity: model.quantity,
        line_total: product.price * Decimal::from(model.quantity),
    }
}

pub fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        product_id: model.product_id,
        product_name: model.product_name,
        quantity: model.quantity,
        unit_price: model.unit_price,
    }
}

pub fn payment_from_entity(model: PaymentModel) -> Payment {
    Payment {
        id: model.id,
        payment_method: model.gateway,
        payment_status: model.status,
        amount: model.amount,
        transaction_reference: model.transaction_reference,
        payment_date: model.payment_date.map(|dt| dt.with_timezone(&Utc)),
    }
}

pub fn order_from_entity(
    model: OrderModel,
    items: Vec<OrderItemModel>,
    payment: Option<PaymentModel>,
) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        total_amount: model.total_amount,
        order_status: model.order_status,
        payment_method: model.payment_method,
        payment_status: model.payment_status,
        shipping_name: model.shipping_name,
        shipping_address: model.shipping_address,
        shipping_phone: model.shipping_phone,
        shipping_email: model.shipping_email,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        items: items.into_iter().map(order_item_from_entity).collect(),
        payment: payment.map(payment_from_entity),
    }
}

pub fn review_from_entity(model: ReviewModel) -> Review {
    Review {
        id: model.id,
        product_id: model.product_id,
        user_id: model.user_id,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
