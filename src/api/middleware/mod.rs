//! API middleware.

mod auth;
mod rate_limit;

pub use auth::{admin_only, auth_middleware};
pub use rate_limit::{rate_limit_middleware, RateLimitError};
