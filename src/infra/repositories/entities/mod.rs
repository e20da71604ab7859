//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod cart;
pub mod cart_item;
pub mod category;
pub mod category_product;
pub mod order;
pub mod order_item;
pub mod product;
pub mod user;
