//! Shopping cart handlers. Every route acts on the caller's own cart.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::parse_id;
use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::{Actor, CartResponse};
use crate::errors::AppResult;
use crate::types::{ApiResponse, Created};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "The Quantity field must be at least 1."))]
    #[schema(example = 2, minimum = 1)]
    pub quantity: i32,
}

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/:item_id", delete(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/v1/cart",
    tag = "Cart",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Cart retrieved successfully", body = CartResponse))
)]
pub async fn get_cart(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let cart = state.services.carts().get(&actor).await?;
    Ok(Json(ApiResponse::with_message(
        CartResponse::from(cart),
        "Cart retrieved successfully",
    )))
}

#[utoipa::path(
    post,
    path = "/v1/cart",
    tag = "Cart",
    security(("bearer_auth" = [])),
    request_body = AddToCartRequest,
    responses(
        (status = 201, description = "Product added to cart successfully", body = CartResponse),
        (status = 400, description = "Product unavailable or insufficient stock"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ValidatedJson(payload): ValidatedJson<AddToCartRequest>,
) -> AppResult<Created<CartResponse>> {
    let cart = state
        .services
        .carts()
        .add(&actor, payload.product_id, payload.quantity)
        .await?;

    Ok(Created(ApiResponse::with_message(
        CartResponse::from(cart),
        "Product added to cart successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/v1/cart/{item_id}",
    tag = "Cart",
    security(("bearer_auth" = [])),
    params(("item_id" = Uuid, Path, description = "Cart item id")),
    responses(
        (status = 200, description = "Product removed from cart successfully", body = CartResponse),
        (status = 403, description = "Item belongs to another cart"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(item_id): Path<String>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let item_id = parse_id(&item_id)?;
    let cart = state.services.carts().remove(&actor, item_id).await?;

    Ok(Json(ApiResponse::with_message(
        CartResponse::from(cart),
        "Product removed from cart successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/v1/cart",
    tag = "Cart",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Cart cleared successfully", body = CartResponse))
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let cart = state.services.carts().clear(&actor).await?;
    Ok(Json(ApiResponse::with_message(
        CartResponse::from(cart),
        "Cart cleared successfully",
    )))
}
