//! Order handlers.

use axum::{
    extract::{OriginalUri, Path, Query, State},
    response::Json,
    routing::{get, patch},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{paginated, parse_id};
use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::{Actor, OrderLineRequest, OrderResponse};
use crate::errors::AppResult;
use crate::types::{ApiResponse, Created, PaginatedResponse, PaginationParams};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "The Quantity field must be at least 1."))]
    #[schema(example = 1, minimum = 1)]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "The Items field is required."),
        nested
    )]
    pub items: Vec<OrderItemRequest>,
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order))
        .route("/:id/cancel", patch(cancel_order))
}

/// List orders; customers only see their own
#[utoipa::path(
    get,
    path = "/v1/orders",
    tag = "Orders",
    security(("bearer_auth" = [])),
    params(PaginationParams),
    responses((status = 200, description = "Orders retrieved successfully", body = [OrderResponse]))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<PaginationParams>,
) -> AppResult<PaginatedResponse<OrderResponse>> {
    let page = state.services.orders().list(&actor, params).await?;
    Ok(paginated(&state, &uri, page, "Orders retrieved successfully"))
}

#[utoipa::path(
    get,
    path = "/v1/orders/{id}",
    tag = "Orders",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order retrieved successfully", body = OrderResponse),
        (status = 403, description = "Order belongs to another user"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderResponse>>> {
    let order = state.services.orders().show(&actor, parse_id(&id)?).await?;
    Ok(Json(ApiResponse::with_message(
        OrderResponse::from(order),
        "Order retrieved successfully",
    )))
}

/// Place an order
#[utoipa::path(
    post,
    path = "/v1/orders",
    tag = "Orders",
    security(("bearer_auth" = [])),
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created successfully", body = OrderResponse),
        (status = 400, description = "Stock changed while placing the order"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ValidatedJson(payload): ValidatedJson<CreateOrderRequest>,
) -> AppResult<Created<OrderResponse>> {
    let lines = payload
        .items
        .into_iter()
        .map(|item| OrderLineRequest {
            product_id: item.product_id,
            quantity: item.quantity,
        })
        .collect();

    let order = state.services.orders().create(&actor, lines).await?;
    Ok(Created(ApiResponse::with_message(
        OrderResponse::from(order),
        "Order created successfully",
    )))
}

/// Cancel an order and restore its stock
#[utoipa::path(
    patch,
    path = "/v1/orders/{id}/cancel",
    tag = "Orders",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled successfully", body = OrderResponse),
        (status = 400, description = "Order already cancelled or completed"),
        (status = 403, description = "Order belongs to another user"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderResponse>>> {
    let order = state.services.orders().cancel(&actor, parse_id(&id)?).await?;
    Ok(Json(ApiResponse::with_message(
        OrderResponse::from(order),
        "Order cancelled successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldErrors;

    #[test]
    fn test_item_quantity_errors_are_indexed() {
        let request = CreateOrderRequest {
            items: vec![
                OrderItemRequest {
                    product_id: Uuid::new_v4(),
                    quantity: 1,
                },
                OrderItemRequest {
                    product_id: Uuid::new_v4(),
                    quantity: 0,
                },
            ],
        };

        let errors = FieldErrors::from(&request.validate().unwrap_err());
        assert!(errors.get("items.1.quantity").is_some());
        assert!(errors.get("items.0.quantity").is_none());
    }

    #[test]
    fn test_empty_items_rejected() {
        let errors = FieldErrors::from(&CreateOrderRequest { items: vec![] }.validate().unwrap_err());
        assert_eq!(
            errors.get("items"),
            Some(&["The Items field is required.".to_string()][..])
        );
    }

    mod routes {
        use std::sync::Arc;

        use axum::{
            body::Body,
            http::{header, Method, Request, StatusCode},
        };
        use tower::ServiceExt;

        use super::*;
        use crate::domain::UserRole;
        use crate::errors::AppError;
        use crate::services::{MockOrderService, MockServiceContainer, OrderService};

        fn router(orders: MockOrderService) -> Router {
            let orders: Arc<dyn OrderService> = Arc::new(orders);
            let mut services = MockServiceContainer::new();
            services.expect_orders().returning(move || orders.clone());

            let actor = Actor::new(Uuid::new_v4(), "jane@example.com", UserRole::Customer);
            Router::new()
                .nest("/v1/orders", order_routes())
                .layer(Extension(actor))
                .with_state(AppState::mocked(services))
        }

        async fn send(app: Router, method: Method, uri: &str, body: &str) -> (StatusCode, String) {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            let response = app.oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            (status, String::from_utf8_lossy(&bytes).into_owned())
        }

        #[tokio::test]
        async fn test_invalid_body_never_reaches_the_service() {
            let mut orders = MockOrderService::new();
            orders.expect_create().never();

            let (status, body) =
                send(router(orders), Method::POST, "/v1/orders", r#"{"items":[]}"#).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert!(body.contains("The Items field is required."));
        }

        #[tokio::test]
        async fn test_malformed_id_is_not_found() {
            let mut orders = MockOrderService::new();
            orders.expect_cancel().never();

            let (status, _) =
                send(router(orders), Method::PATCH, "/v1/orders/42/cancel", "").await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }

        #[tokio::test]
        async fn test_cancel_surfaces_business_errors() {
            let order_id = Uuid::new_v4();
            let mut orders = MockOrderService::new();
            orders
                .expect_cancel()
                .withf(move |_, id| *id == order_id)
                .times(1)
                .returning(|_, _| Err(AppError::bad_request("Order is already cancelled.")));

            let uri = format!("/v1/orders/{}/cancel", order_id);
            let (status, body) = send(router(orders), Method::PATCH, &uri, "").await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body.contains("Order is already cancelled."));
        }
    }
}
