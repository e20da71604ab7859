//! Dispatch of order notifications onto the job queue.

use apalis::prelude::Storage;
use apalis_sql::postgres::PostgresStorage;
use async_trait::async_trait;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use super::OrderConfirmationJob;
use crate::errors::{AppError, AppResult};

/// Outbound notifications for order events.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    /// Called once the order transaction has committed.
    async fn order_placed(&self, job: OrderConfirmationJob) -> AppResult<()>;
}

/// Pushes confirmations to the apalis PostgreSQL queue.
pub struct QueueNotifier {
    storage: PostgresStorage<OrderConfirmationJob>,
}

impl QueueNotifier {
    pub fn new(storage: PostgresStorage<OrderConfirmationJob>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl OrderNotifier for QueueNotifier {
    async fn order_placed(&self, job: OrderConfirmationJob) -> AppResult<()> {
        let order_id = job.order_id;
        let mut storage = self.storage.clone();
        storage
            .push(job)
            .await
            .map_err(|e| AppError::unavailable(format!("Failed to enqueue job: {}", e)))?;

        tracing::debug!(%order_id, "Order confirmation queued");
        Ok(())
    }
}

/// Writes confirmations to the log; used when no queue is configured.
pub struct LogNotifier;

#[async_trait]
impl OrderNotifier for LogNotifier {
    async fn order_placed(&self, job: OrderConfirmationJob) -> AppResult<()> {
        tracing::info!(
            order_id = %job.order_id,
            to = %job.customer_email,
            "Order confirmation not queued (no job backend)"
        );
        Ok(())
    }
}
