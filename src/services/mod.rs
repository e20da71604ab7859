//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion.
//!
//! All services use Unit of Work pattern for centralized repository
//! access and transaction management.

mod auth_service;
mod cart_service;
mod category_service;
mod common;
pub mod container;
mod order_service;
mod product_service;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use auth_service::{AuthResponse, AuthService, Authenticator, Claims};
pub use cart_service::{CartManager, CartService};
pub use category_service::{category_cache_key, list_cache_key, CategoryManager, CategoryService};
pub use order_service::{OrderManager, OrderService};
pub use product_service::{ProductManager, ProductService};

#[cfg(any(test, feature = "test-utils"))]
pub use auth_service::MockAuthService;
#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
#[cfg(any(test, feature = "test-utils"))]
pub use order_service::MockOrderService;
#[cfg(any(test, feature = "test-utils"))]
pub use product_service::MockProductService;
