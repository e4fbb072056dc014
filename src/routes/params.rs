use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    /// `(page, per_page, offset)` when the caller asked for a page, `None`
    /// when the whole result set should be returned.
    pub fn normalize(&self) -> Option<(i64, i64, i64)> {
        if self.page.is_none() && self.per_page.is_none() {
            return None;
        }
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        Some((page, per_page, offset))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortBy {
    CreatedAt,
    Price,
    Name,
}

impl ProductSortBy {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "price" => Some(ProductSortBy::Price),
            "createdAt" | "created_at" => Some(ProductSortBy::CreatedAt),
            "name" => Some(ProductSortBy::Name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: ProductSortBy,
    pub order: SortOrder,
}

impl SortKey {
    /// Parses `field[,direction]`. Unknown fields yield `None` and are skipped
    /// by the caller; an unknown direction falls back to ascending.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(2, ',');
        let field = ProductSortBy::parse(parts.next()?)?;
        let order = parts
            .next()
            .and_then(SortOrder::parse)
            .unwrap_or(SortOrder::Asc);
        Some(SortKey { field, order })
    }
}

/// Documentation shape of the product search query string.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
#[allow(dead_code)]
pub struct ProductSearchParams {
    /// Restrict to one category.
    pub category_id: Option<Uuid>,
    #[param(value_type = Option<String>)]
    pub min_price: Option<Decimal>,
    #[param(value_type = Option<String>)]
    pub max_price: Option<Decimal>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
    /// Repeatable, e.g. `price,desc`. Keys: price, createdAt, name.
    pub sort: Option<Vec<String>>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Default, Clone)]
pub struct ProductSearch {
    pub category_id: Option<Uuid>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
    pub sort: Vec<SortKey>,
    pub pagination: Pagination,
}

impl ProductSearch {
    /// Builds the search from raw query pairs so `sort` can repeat.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> AppResult<Self> {
        let mut query = ProductSearch::default();
        for (key, value) in pairs {
            match key.as_str() {
                "categoryId" => query.category_id = Some(parse_value(&key, &value)?),
                "minPrice" => query.min_price = Some(parse_value(&key, &value)?),
                "maxPrice" => query.max_price = Some(parse_value(&key, &value)?),
                "search" => query.search = Some(value),
                "sort" => query.sort.extend(SortKey::parse(&value)),
                "page" => query.pagination.page = Some(parse_value(&key, &value)?),
                "perPage" => query.pagination.per_page = Some(parse_value(&key, &value)?),
                _ => {}
            }
        }
        Ok(query)
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> AppResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::bad_request(format!("Invalid value for {key}")))
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    /// Only orders placed by this user.
    pub user_id: Option<Uuid>,
}
