//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    auth_handler, cart_handler, category_handler, order_handler, product_handler,
};
use crate::domain::{
    CartItemResponse, CartResponse, CategoryResponse, CategorySummary, OrderItemResponse,
    OrderResponse, OrderStatus, ProductResponse, ProductStatus, ProductSummary, UserResponse,
};
use crate::services::AuthResponse;
use crate::types::{FieldErrors, PaginationMeta};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = "Catalog, cart and order workflow for an online shop",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        auth_handler::register,
        auth_handler::login,
        auth_handler::logout,
        product_handler::list_products,
        product_handler::get_product,
        product_handler::create_product,
        product_handler::update_product,
        product_handler::delete_product,
        product_handler::trashed_products,
        product_handler::restore_product,
        product_handler::force_delete_product,
        category_handler::list_categories,
        category_handler::get_category,
        category_handler::create_category,
        category_handler::update_category,
        category_handler::delete_category,
        cart_handler::get_cart,
        cart_handler::add_to_cart,
        cart_handler::remove_from_cart,
        cart_handler::clear_cart,
        order_handler::list_orders,
        order_handler::get_order,
        order_handler::create_order,
        order_handler::cancel_order,
    ),
    components(
        schemas(
            UserResponse,
            AuthResponse,
            ProductStatus,
            ProductResponse,
            ProductSummary,
            CategoryResponse,
            CategorySummary,
            CartResponse,
            CartItemResponse,
            OrderStatus,
            OrderResponse,
            OrderItemResponse,
            PaginationMeta,
            FieldErrors,
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            product_handler::CreateProductRequest,
            product_handler::UpdateProductRequest,
            category_handler::CreateCategoryRequest,
            category_handler::UpdateCategoryRequest,
            cart_handler::AddToCartRequest,
            order_handler::CreateOrderRequest,
            order_handler::OrderItemRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and logout"),
        (name = "Products", description = "Product catalog and trash"),
        (name = "Categories", description = "Product categories"),
        (name = "Cart", description = "The caller's shopping cart"),
        (name = "Orders", description = "Order placement and cancellation")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token obtained from /v1/login"))
                        .build(),
                ),
            );
        }
    }
}
