//! Order confirmation job.
//!
//! The payload is a snapshot taken right after the order commits, so the
//! worker never needs to read the order back.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::email_job::{email_job_handler, EmailJob};
use crate::domain::{format_price, OrderDetails, User};
use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationLine {
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmationJob {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub total: Decimal,
    pub lines: Vec<ConfirmationLine>,
}

impl OrderConfirmationJob {
    pub fn new(details: &OrderDetails, customer: &User) -> Self {
        Self {
            order_id: details.order.id,
            order_number: details.order.order_number.clone(),
            customer_name: customer.name.clone(),
            customer_email: customer.email.clone(),
            total: details.order.total,
            lines: details
                .lines
                .iter()
                .map(|line| ConfirmationLine {
                    product_name: line.product.name.clone(),
                    quantity: line.item.quantity,
                    price: line.item.price,
                })
                .collect(),
        }
    }

    /// Render the customer-facing message.
    pub fn to_email(&self) -> EmailJob {
        let mut body = format!(
            "Hello {},\n\nThank you for your order #{}.\n\n",
            self.customer_name, self.order_number
        );
        for line in &self.lines {
            body.push_str(&format!(
                "- {} x {} @ {}\n",
                line.quantity,
                line.product_name,
                format_price(line.price)
            ));
        }
        body.push_str(&format!("\nTotal: {}\n", format_price(self.total)));

        EmailJob::new(
            self.customer_email.clone(),
            format!("Order Confirmation - #{}", self.order_number),
            body,
        )
    }
}

/// Worker entry point for queued confirmations.
pub async fn order_confirmation_handler(job: OrderConfirmationJob) -> Result<(), AppError> {
    tracing::info!(order_id = %job.order_id, "Sending order confirmation");
    email_job_handler(job.to_email()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_email_lists_lines_and_total() {
        let job = OrderConfirmationJob {
            order_id: Uuid::new_v4(),
            order_number: "abc-123".into(),
            customer_name: "Jane Doe".into(),
            customer_email: "jane@example.com".into(),
            total: dec!(50.00),
            lines: vec![
                ConfirmationLine {
                    product_name: "Mouse".into(),
                    quantity: 1,
                    price: dec!(10.00),
                },
                ConfirmationLine {
                    product_name: "Keyboard".into(),
                    quantity: 2,
                    price: dec!(20.00),
                },
            ],
        };

        let email = job.to_email();
        assert_eq!(email.to, "jane@example.com");
        assert_eq!(email.subject, "Order Confirmation - #abc-123");
        assert!(email.body.contains("Hello Jane Doe"));
        assert!(email.body.contains("- 2 x Keyboard @ 20.00 $"));
        assert!(email.body.contains("Total: 50.00 $"));
    }
}
