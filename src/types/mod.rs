//! Shared types for DRY compliance.

mod pagination;
mod response;
mod validation;

pub use pagination::{Paginated, PaginationMeta, PaginationParams};
pub use response::{ApiResponse, Created, PaginatedResponse};
pub use validation::FieldErrors;
