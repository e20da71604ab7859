//! Order aggregate: the order row and its write-once line items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::product::{Product, ProductSummary};
use crate::errors::{AppError, AppResult};

/// Order lifecycle. Only `pending -> cancelled` is driven by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl From<&str> for OrderStatus {
    fn from(s: &str) -> Self {
        match s {
            "processing" => OrderStatus::Processing,
            "completed" => OrderStatus::Completed,
            "cancelled" => OrderStatus::Cancelled,
            _ => OrderStatus::Pending,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order domain entity
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_number: String,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_cancelled(&self) -> bool {
        self.status == OrderStatus::Cancelled
    }

    pub fn is_completed(&self) -> bool {
        self.status == OrderStatus::Completed
    }

    /// Cancellation preconditions, reported as client errors.
    pub fn ensure_cancellable(&self) -> AppResult<()> {
        if self.is_cancelled() {
            return Err(AppError::bad_request("Order is already cancelled."));
        }
        if self.is_completed() {
            return Err(AppError::bad_request("Cannot cancel a completed order."));
        }
        Ok(())
    }
}

/// Line item; `price` is the unit price at purchase time
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Requested product and quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub item: OrderItem,
    pub product: Product,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetails {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Sum of `quantity * price` over the lines
pub fn order_total<'a>(items: impl IntoIterator<Item = &'a OrderItem>) -> Decimal {
    items.into_iter().map(OrderItem::subtotal).sum()
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product: ProductSummary,
    pub quantity: i32,
    #[schema(value_type = String, example = "10.00")]
    pub price: Decimal,
    #[schema(value_type = String, example = "20.00")]
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    #[schema(example = "0b6c5a0e-5f7e-4bb1-9c0e-27e1b6a4c2d1")]
    pub order_number: String,
    pub user_id: Uuid,
    #[schema(value_type = String, example = "50.00")]
    pub total: Decimal,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderDetails> for OrderResponse {
    fn from(details: OrderDetails) -> Self {
        let OrderDetails { order, lines } = details;

        Self {
            id: order.id,
            order_number: order.order_number,
            user_id: order.user_id,
            total: order.total,
            status: order.status,
            items: lines
                .into_iter()
                .map(|line| OrderItemResponse {
                    id: line.item.id,
                    product_id: line.item.product_id,
                    subtotal: line.item.subtotal(),
                    quantity: line.item.quantity,
                    price: line.item.price,
                    product: ProductSummary::from(line.product),
                })
                .collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}
