//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connections, migrations and repositories
//! - Caching backends (Redis or in-process)
//! - Unit of Work for transaction management

pub mod cache;
pub mod db;
pub mod repositories;
pub mod unit_of_work;

pub use cache::{connect_store, Cache, CacheStore, MemoryStore};
pub use db::{Database, Migrator};
pub use repositories::Repositories;
pub use unit_of_work::{Persistence, TransactionContext, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use cache::MockCacheStore;
