//! Product catalog handlers.

use axum::{
    extract::{OriginalUri, Path, Query, State},
    response::Json,
    routing::{delete, get, post, put},
    Extension, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::paginated;
use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::config::MAX_PRODUCT_PRICE;
use crate::domain::{Actor, NewProduct, ProductChanges, ProductFilter, ProductResponse, ProductStatus};
use crate::errors::AppResult;
use crate::types::{ApiResponse, Created, PaginatedResponse, PaginationParams};

/// Listing filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Category slug
    pub category: Option<String>,
    #[param(value_type = Option<String>)]
    pub price_min: Option<Decimal>,
    #[param(value_type = Option<String>)]
    pub price_max: Option<Decimal>,
    /// `true`/`1` for in stock, `false`/`0` for out of stock
    pub in_stock: Option<String>,
    /// Substring of the product name
    pub search: Option<String>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        let in_stock = query.in_stock.as_deref().and_then(|raw| match raw {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        });

        Self {
            category: query.category.filter(|c| !c.is_empty()),
            price_min: query.price_min,
            price_max: query.price_max,
            in_stock,
            search: query.search.filter(|s| !s.trim().is_empty()),
        }
    }
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    let max: Decimal = MAX_PRODUCT_PRICE.parse().unwrap_or(Decimal::MAX);
    if price.is_sign_negative() || *price > max {
        let mut error = ValidationError::new("price");
        error.message = Some(
            format!("The Price field must be between 0 and {}.", MAX_PRODUCT_PRICE).into(),
        );
        return Err(error);
    }
    Ok(())
}

/// Create product request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(
        min = 3,
        max = 255,
        message = "The Name field must be between 3 and 255 characters."
    ))]
    #[schema(example = "wireless mouse")]
    pub name: String,
    #[validate(length(max = 1000, message = "The Description field must not be greater than 1000 characters."))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = String, example = "29.99")]
    pub price: Decimal,
    #[validate(range(min = 0, message = "The Quantity field must be at least 0."))]
    pub quantity: i32,
    #[serde(default)]
    pub status: ProductStatus,
    /// Category ids, at least one
    #[serde(default)]
    #[validate(length(min = 1, message = "The Categories field is required."))]
    pub categories: Vec<Uuid>,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(request: CreateProductRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            price: request.price,
            quantity: request.quantity,
            status: request.status,
            category_ids: request.categories,
        }
    }
}

/// Update product request; omitted fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(
        min = 3,
        max = 255,
        message = "The Name field must be between 3 and 255 characters."
    ))]
    pub name: Option<String>,
    #[validate(length(max = 1000, message = "The Description field must not be greater than 1000 characters."))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = Option<String>, example = "24.99")]
    pub price: Option<Decimal>,
    #[validate(range(min = 0, message = "The Quantity field must be at least 0."))]
    pub quantity: Option<i32>,
    pub status: Option<ProductStatus>,
    /// Replaces category membership when present
    #[validate(length(min = 1, message = "The Categories field is required."))]
    pub categories: Option<Vec<Uuid>>,
}

impl From<UpdateProductRequest> for ProductChanges {
    fn from(request: UpdateProductRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            price: request.price,
            quantity: request.quantity,
            status: request.status,
            category_ids: request.categories,
        }
    }
}

/// Public catalog routes
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/:slug", get(get_product))
}

/// Admin catalog routes
pub fn product_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_product))
        .route("/trashed", get(trashed_products))
        .route("/:slug", put(update_product).delete(delete_product))
        .route("/:slug/restore", post(restore_product))
        .route("/:slug/force", delete(force_delete_product))
}

/// List products
#[utoipa::path(
    get,
    path = "/v1/products",
    tag = "Products",
    params(PaginationParams, ProductQuery),
    responses((status = 200, description = "Products retrieved successfully", body = [ProductResponse]))
)]
pub async fn list_products(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<PaginationParams>,
    Query(query): Query<ProductQuery>,
) -> AppResult<PaginatedResponse<ProductResponse>> {
    let page = state
        .services
        .products()
        .list(ProductFilter::from(query), params)
        .await?;

    Ok(paginated(&state, &uri, page, "Products retrieved successfully"))
}

/// Get a product by slug
#[utoipa::path(
    get,
    path = "/v1/products/{slug}",
    tag = "Products",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product retrieved successfully", body = ProductResponse),
        (status = 404, description = "Product not found")
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<ProductResponse>>> {
    let product = state.services.products().show(&slug).await?;
    Ok(Json(ApiResponse::with_message(
        ProductResponse::from(product),
        "Product retrieved successfully",
    )))
}

/// Create a product (admin only)
#[utoipa::path(
    post,
    path = "/v1/products",
    tag = "Products",
    security(("bearer_auth" = [])),
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created successfully", body = ProductResponse),
        (status = 403, description = "Admin access required"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ValidatedJson(payload): ValidatedJson<CreateProductRequest>,
) -> AppResult<Created<ProductResponse>> {
    let product = state
        .services
        .products()
        .create(&actor, NewProduct::from(payload))
        .await?;

    Ok(Created(ApiResponse::with_message(
        ProductResponse::from(product),
        "Product created successfully",
    )))
}

/// Update a product (admin only)
#[utoipa::path(
    put,
    path = "/v1/products/{slug}",
    tag = "Products",
    security(("bearer_auth" = [])),
    params(("slug" = String, Path, description = "Product slug")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated successfully", body = ProductResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Product not found"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<ProductResponse>>> {
    let product = state
        .services
        .products()
        .update(&actor, &slug, ProductChanges::from(payload))
        .await?;

    Ok(Json(ApiResponse::with_message(
        ProductResponse::from(product),
        "Product updated successfully",
    )))
}

/// Move a product to the trash (admin only)
#[utoipa::path(
    delete,
    path = "/v1/products/{slug}",
    tag = "Products",
    security(("bearer_auth" = [])),
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product deleted successfully"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.services.products().delete(&actor, &slug).await?;
    Ok(Json(ApiResponse::message("Product deleted successfully")))
}

/// List trashed products (admin only)
#[utoipa::path(
    get,
    path = "/v1/products/trashed",
    tag = "Products",
    security(("bearer_auth" = [])),
    params(PaginationParams),
    responses(
        (status = 200, description = "Trashed products retrieved successfully", body = [ProductResponse]),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn trashed_products(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<PaginationParams>,
) -> AppResult<PaginatedResponse<ProductResponse>> {
    let page = state.services.products().trashed(&actor, params).await?;
    Ok(paginated(
        &state,
        &uri,
        page,
        "Trashed products retrieved successfully",
    ))
}

/// Restore a trashed product (admin only)
#[utoipa::path(
    post,
    path = "/v1/products/{slug}/restore",
    tag = "Products",
    security(("bearer_auth" = [])),
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product restored successfully", body = ProductResponse),
        (status = 404, description = "No trashed product with this slug")
    )
)]
pub async fn restore_product(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<ProductResponse>>> {
    let product = state.services.products().restore(&actor, &slug).await?;
    Ok(Json(ApiResponse::with_message(
        ProductResponse::from(product),
        "Product restored successfully",
    )))
}

/// Permanently delete a trashed product (admin only)
#[utoipa::path(
    delete,
    path = "/v1/products/{slug}/force",
    tag = "Products",
    security(("bearer_auth" = [])),
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product permanently deleted successfully"),
        (status = 400, description = "Product has order history"),
        (status = 404, description = "No trashed product with this slug")
    )
)]
pub async fn force_delete_product(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.services.products().force_delete(&actor, &slug).await?;
    Ok(Json(ApiResponse::message(
        "Product permanently deleted successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_request(price: Decimal, categories: Vec<Uuid>) -> CreateProductRequest {
        CreateProductRequest {
            name: "Desk Lamp".to_string(),
            description: None,
            price,
            quantity: 5,
            status: ProductStatus::Active,
            categories,
        }
    }

    #[test]
    fn test_price_bounds() {
        assert!(validate_price(&dec!(0)).is_ok());
        assert!(validate_price(&dec!(999999.99)).is_ok());
        assert!(validate_price(&dec!(-0.01)).is_err());
        assert!(validate_price(&dec!(1000000)).is_err());
    }

    #[test]
    fn test_create_requires_categories() {
        let errors = create_request(dec!(10), vec![]).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("categories"));

        assert!(create_request(dec!(10), vec![Uuid::new_v4()]).validate().is_ok());
    }

    #[test]
    fn test_in_stock_flag_parsing() {
        let filter = ProductFilter::from(ProductQuery {
            in_stock: Some("0".to_string()),
            search: Some("  ".to_string()),
            ..Default::default()
        });
        assert_eq!(filter.in_stock, Some(false));
        assert_eq!(filter.search, None);

        let filter = ProductFilter::from(ProductQuery {
            in_stock: Some("true".to_string()),
            ..Default::default()
        });
        assert_eq!(filter.in_stock, Some(true));
    }

    #[tokio::test]
    async fn test_list_passes_filters_and_links_pages() {
        use std::sync::Arc;

        use axum::{body::Body, http::Request};
        use tower::ServiceExt;

        use crate::services::{MockProductService, MockServiceContainer, ProductService};
        use crate::types::Paginated;

        let mut products = MockProductService::new();
        products
            .expect_list()
            .withf(|filter, params| {
                filter.search.as_deref() == Some("lamp")
                    && filter.in_stock == Some(true)
                    && params.page() == 1
            })
            .times(1)
            .returning(|_, params| Ok(Paginated::new(vec![], &params, 31)));
        let products: Arc<dyn ProductService> = Arc::new(products);

        let mut services = MockServiceContainer::new();
        services.expect_products().returning(move || products.clone());
        let app = Router::new()
            .nest("/v1/products", product_routes())
            .with_state(AppState::mocked(services));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/products?search=lamp&in_stock=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["message"], "Products retrieved successfully");
        assert_eq!(body["pagination"]["total_pages"], 3);
        assert_eq!(
            body["pagination"]["next_page_url"],
            "http://localhost:3000/v1/products?search=lamp&in_stock=1&page=2"
        );
    }
}
