//! Repository layer - Data access abstraction
//!
//! Each repository borrows a connection, so the same queries serve pooled
//! reads and transactional writes alike.

mod base;
mod cart_repository;
mod category_repository;
pub(crate) mod entities;
mod order_repository;
mod product_repository;
mod user_repository;

pub use base::Repositories;
pub use cart_repository::CartRepository;
pub use category_repository::CategoryRepository;
pub use order_repository::OrderRepository;
pub use product_repository::ProductRepository;
pub use user_repository::UserRepository;
