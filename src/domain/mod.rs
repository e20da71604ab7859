//! Domain layer - Core business entities and logic
//!
//! This module contains the core domain models that represent
//! business concepts independent of infrastructure concerns.
//!
//! Contains: Entities, Value Objects, response shapes.

pub mod cart;
pub mod category;
pub mod order;
pub mod password;
pub mod product;
pub mod slug;
pub mod user;

pub use cart::{Cart, CartDetails, CartItem, CartItemResponse, CartLine, CartResponse};
pub use category::{Category, CategoryDetails, CategoryResponse, CategorySummary};
pub use order::{
    order_total, Order, OrderDetails, OrderItem, OrderItemResponse, OrderLine, OrderLineRequest,
    OrderResponse, OrderStatus,
};
pub use password::Password;
pub use product::{
    format_price, NewProduct, Product, ProductChanges, ProductDetails, ProductFilter,
    ProductResponse, ProductStatus, ProductSummary,
};
pub use user::{Actor, NewUser, User, UserResponse, UserRole};
