//! Category handlers.

use axum::{
    extract::{OriginalUri, Path, Query, State},
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::paginated;
use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::{Actor, CategoryResponse};
use crate::errors::AppResult;
use crate::types::{ApiResponse, Created, PaginatedResponse, PaginationParams};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(
        min = 3,
        max = 100,
        message = "The Name field must be between 3 and 100 characters."
    ))]
    #[schema(example = "Home Office")]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(length(
        min = 3,
        max = 100,
        message = "The Name field must be between 3 and 100 characters."
    ))]
    pub name: Option<String>,
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories))
        .route("/:slug", get(get_category))
}

pub fn category_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_category))
        .route("/:slug", put(update_category).delete(delete_category))
}

/// List categories with their products
#[utoipa::path(
    get,
    path = "/v1/categories",
    tag = "Categories",
    params(PaginationParams),
    responses((status = 200, description = "Categories retrieved successfully", body = [CategoryResponse]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<PaginationParams>,
) -> AppResult<PaginatedResponse<CategoryResponse>> {
    let page = state.services.categories().list(params).await?;
    Ok(paginated(&state, &uri, page, "Categories retrieved successfully"))
}

#[utoipa::path(
    get,
    path = "/v1/categories/{slug}",
    tag = "Categories",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category retrieved successfully", body = CategoryResponse),
        (status = 404, description = "Category not found")
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<CategoryResponse>>> {
    let category = state.services.categories().show(&slug).await?;
    Ok(Json(ApiResponse::with_message(
        CategoryResponse::from(category),
        "Category retrieved successfully",
    )))
}

#[utoipa::path(
    post,
    path = "/v1/categories",
    tag = "Categories",
    security(("bearer_auth" = [])),
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created successfully", body = CategoryResponse),
        (status = 403, description = "Admin access required"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ValidatedJson(payload): ValidatedJson<CreateCategoryRequest>,
) -> AppResult<Created<CategoryResponse>> {
    let category = state
        .services
        .categories()
        .create(&actor, payload.name)
        .await?;

    Ok(Created(ApiResponse::with_message(
        CategoryResponse::from(category),
        "Category created successfully",
    )))
}

#[utoipa::path(
    put,
    path = "/v1/categories/{slug}",
    tag = "Categories",
    security(("bearer_auth" = [])),
    params(("slug" = String, Path, description = "Category slug")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated successfully", body = CategoryResponse),
        (status = 404, description = "Category not found"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn update_category(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateCategoryRequest>,
) -> AppResult<Json<ApiResponse<CategoryResponse>>> {
    let category = state
        .services
        .categories()
        .update(&actor, &slug, payload.name)
        .await?;

    Ok(Json(ApiResponse::with_message(
        CategoryResponse::from(category),
        "Category updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/v1/categories/{slug}",
    tag = "Categories",
    security(("bearer_auth" = [])),
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category deleted successfully"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.services.categories().delete(&actor, &slug).await?;
    Ok(Json(ApiResponse::message("Category deleted successfully")))
}
