//! Category entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::product::{Product, ProductSummary};

/// Category domain entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A category with its live products
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDetails {
    pub category: Category,
    pub products: Vec<Product>,
}

/// Category as returned to clients
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    #[schema(example = "Electronics")]
    pub name: String,
    #[schema(example = "electronics")]
    pub slug: String,
    pub products: Vec<ProductSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CategoryDetails> for CategoryResponse {
    fn from(details: CategoryDetails) -> Self {
        let CategoryDetails { category, products } = details;

        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
            products: products.into_iter().map(ProductSummary::from).collect(),
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

/// Compact category embedded in product responses
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<Category> for CategorySummary {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
        }
    }
}
