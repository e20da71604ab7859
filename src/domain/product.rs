//! Product catalog entity and related types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::category::{Category, CategorySummary};
use crate::config::LOW_STOCK_THRESHOLD;

/// Whether a product is offered for sale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
        }
    }
}

impl From<&str> for ProductStatus {
    fn from(s: &str) -> Self {
        match s {
            "active" => ProductStatus::Active,
            _ => ProductStatus::Inactive,
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft delete timestamp (None = live, Some = trashed)
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }

    /// Active, in stock and not trashed
    pub fn is_available(&self) -> bool {
        self.is_active() && self.in_stock() && !self.is_trashed()
    }

    pub fn is_low_stock(&self) -> bool {
        (1..=LOW_STOCK_THRESHOLD).contains(&self.quantity)
    }

    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn price_formatted(&self) -> String {
        format_price(self.price)
    }
}

/// `99.99 $`
pub fn format_price(price: Decimal) -> String {
    format!("{:.2} $", price.round_dp(2))
}

/// A product together with the categories it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub product: Product,
    pub categories: Vec<Category>,
}

/// Allow-listed fields for creating a product
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub status: ProductStatus,
    pub category_ids: Vec<Uuid>,
}

/// Allow-listed fields for updating a product. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub status: Option<ProductStatus>,
    /// Replaces category membership when present
    pub category_ids: Option<Vec<Uuid>>,
}

/// Listing filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Category slug
    pub category: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    /// `true` for quantity > 0, `false` for quantity = 0
    pub in_stock: Option<bool>,
    /// Case-insensitive substring of the name
    pub search: Option<String>,
}

/// Product as returned to clients
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    #[schema(example = "Wireless Mouse")]
    pub name: String,
    #[schema(example = "wireless-mouse")]
    pub slug: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "99.99")]
    pub price: Decimal,
    #[schema(example = "99.99 $")]
    pub price_formatted: String,
    pub quantity: i32,
    pub status: ProductStatus,
    pub categories: Vec<CategorySummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<ProductDetails> for ProductResponse {
    fn from(details: ProductDetails) -> Self {
        let ProductDetails {
            product,
            categories,
        } = details;

        Self {
            price_formatted: product.price_formatted(),
            id: product.id,
            name: product.name,
            slug: product.slug,
            description: product.description,
            price: product.price,
            quantity: product.quantity,
            status: product.status,
            categories: categories.into_iter().map(CategorySummary::from).collect(),
            created_at: product.created_at,
            updated_at: product.updated_at,
            deleted_at: product.deleted_at,
        }
    }
}

/// Compact product embedded in categories, cart lines and order lines
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[schema(value_type = String, example = "99.99")]
    pub price: Decimal,
    pub price_formatted: String,
    pub quantity: i32,
    pub status: ProductStatus,
}

impl From<Product> for ProductSummary {
    fn from(product: Product) -> Self {
        Self {
            price_formatted: product.price_formatted(),
            id: product.id,
            name: product.name,
            slug: product.slug,
            price: product.price,
            quantity: product.quantity,
            status: product.status,
        }
    }
}
