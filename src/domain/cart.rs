//! Shopping cart entities.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::product::{Product, ProductSummary};

/// One cart per user, created on first access
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Line item; `price` is the unit price captured when the line was last added to
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItem {
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub item: CartItem,
    pub product: Product,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartDetails {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
}

impl CartDetails {
    /// Sum of snapshot price times quantity over all lines
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(|line| line.item.subtotal()).sum()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartItemResponse {
    pub id: Uuid,
    pub product: ProductSummary,
    pub quantity: i32,
    #[schema(value_type = String, example = "10.00")]
    pub price: Decimal,
    #[schema(value_type = String, example = "20.00")]
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CartResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = String, example = "20.00")]
    pub total: Decimal,
    pub items: Vec<CartItemResponse>,
}

impl From<CartDetails> for CartResponse {
    fn from(details: CartDetails) -> Self {
        let total = details.total();

        Self {
            id: details.cart.id,
            user_id: details.cart.user_id,
            total,
            items: details
                .lines
                .into_iter()
                .map(|line| CartItemResponse {
                    id: line.item.id,
                    subtotal: line.item.subtotal(),
                    quantity: line.item.quantity,
                    price: line.item.price,
                    product: ProductSummary::from(line.product),
                })
                .collect(),
        }
    }
}
