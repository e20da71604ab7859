//! Storefront API - e-commerce REST backend
//!
//! Catalog (products with soft delete, cached categories), per-user carts
//! and an order workflow with row-locked stock control, served over axum
//! with SeaORM persistence.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Core business entities and logic
//! - **services**: Application use cases and business logic
//! - **infra**: Database, repositories, unit of work and cache stores
//! - **jobs**: Background jobs (order confirmation, email)
//! - **api**: HTTP handlers, middleware, and routes
//! - **types**: Shared types (pagination, responses, field errors)
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//!
//! # Process queued order confirmations
//! cargo run -- jobs work
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod jobs;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Actor, Password, User, UserRole};
pub use errors::{AppError, AppResult};
