//! HTTP request handlers.

pub mod auth_handler;
pub mod cart_handler;
pub mod category_handler;
pub mod order_handler;
pub mod product_handler;

use axum::http::Uri;
use serde::Serialize;
use uuid::Uuid;

use crate::api::AppState;
use crate::errors::{AppError, AppResult};
use crate::types::{Paginated, PaginatedResponse, PaginationMeta};

pub use auth_handler::{auth_routes, session_routes};
pub use cart_handler::cart_routes;
pub use category_handler::{category_admin_routes, category_routes};
pub use order_handler::order_routes;
pub use product_handler::{product_admin_routes, product_routes};

/// Wrap a service page in the list envelope with absolute page links.
pub(crate) fn paginated<T, R>(
    state: &AppState,
    uri: &Uri,
    page: Paginated<T>,
    message: &str,
) -> PaginatedResponse<R>
where
    R: From<T> + Serialize,
{
    let base_url = format!("{}{}", state.app_url, uri.path());
    let meta = PaginationMeta::new(&page, &base_url, uri.query());

    PaginatedResponse::new(page.items.into_iter().map(R::from).collect(), meta)
        .with_message(message)
}

/// Malformed ids cannot match any row.
pub(crate) fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound)
}
