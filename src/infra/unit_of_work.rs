//! Unit of Work: repository access and transaction lifecycle.
//!
//! Reads go through [`UnitOfWork::repositories`] on the pooled connection.
//! Multi-step writes run inside [`UnitOfWork::transaction`], where every
//! repository borrows the same `DatabaseTransaction`.

use async_trait::async_trait;
use sea_orm::{
    AccessMode, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait,
};

use super::repositories::Repositories;
use crate::errors::{AppError, AppResult};

/// Repository access bound to one open transaction.
pub type TransactionContext<'a> = Repositories<'a, DatabaseTransaction>;

/// Unit of Work trait for dependency injection.
///
/// Not mockable directly because of the generic transaction methods;
/// services are tested against SQLite or mocked at the service level.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Repositories over the connection pool
    fn repositories(&self) -> Repositories<'_, DatabaseConnection>;

    /// Execute a closure within a transaction.
    ///
    /// Committed when the closure returns `Ok`, rolled back otherwise.
    /// Runs at ReadCommitted; row locks taken inside the closure are held
    /// until commit.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send;
}

/// SeaORM-backed implementation of UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn execute_transaction<F, T>(&self, isolation: IsolationLevel, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        let txn = self
            .db
            .begin_with_config(Some(isolation), Some(AccessMode::ReadWrite))
            .await
            .map_err(AppError::from)?;

        let ctx = Repositories::new(&txn);

        match f(ctx).await {
            Ok(result) => {
                txn.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn repositories(&self) -> Repositories<'_, DatabaseConnection> {
        Repositories::new(&self.db)
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        self.execute_transaction(IsolationLevel::ReadCommitted, f)
            .await
    }
}

/// Run a block inside `UnitOfWork::transaction`.
///
/// ```ignore
/// with_transaction!(self.uow, |tx| tx.products().force_delete(id).await)?;
/// ```
#[macro_export]
macro_rules! with_transaction {
    ($uow:expr, |$ctx:ident| $body:expr) => {
        $uow.transaction(move |$ctx| Box::pin(async move { $body })).await
    };
}
