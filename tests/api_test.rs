//! HTTP surface: routing, middleware and envelopes.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use storefront_api::api::create_router;
use storefront_api::domain::OrderLineRequest;
use storefront_api::services::ServiceContainer;

use common::{setup, TestApp, PASSWORD};

fn router(app: &TestApp) -> Router {
    create_router(app.state())
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = router(app).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_reports_healthy() {
    let app = setup().await;

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["database"]["status"], "healthy");
}

#[tokio::test]
async fn test_register_and_login() {
    let app = setup().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/register",
        None,
        Some(json!({
            "name": "jane doe",
            "email": "jane@example.com",
            "password": PASSWORD,
            "password_confirmation": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Registered successfully!");
    assert_eq!(body["data"]["user"]["name"], "Jane Doe");
    assert_eq!(body["data"]["type"], "bearer");
    assert!(body["data"]["token"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/login",
        None,
        Some(json!({ "email": "jane@example.com", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged in successfully");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = setup().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/register",
        None,
        Some(json!({
            "name": "Jane",
            "email": "not-an-email",
            "password": PASSWORD,
            "password_confirmation": "different",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["password"].is_array());
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let app = setup().await;

    let (status, body) = send(&app, Method::GET, "/v1/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "UNAUTHENTICATED");

    let (status, _) = send(&app, Method::GET, "/v1/orders", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_revoked_token_is_rejected() {
    let app = setup().await;
    app.customer("jane@example.com").await;
    let token = app.token("jane@example.com").await;

    let (status, _) = send(&app, Method::GET, "/v1/cart", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::POST, "/v1/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");

    let (status, body) = send(&app, Method::GET, "/v1/cart", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_catalog_writes_are_admin_only() {
    let app = setup().await;
    let admin = app.admin().await;
    app.customer("jane@example.com").await;
    let category = app.category(&admin, "Office").await;

    let payload = json!({
        "name": "desk lamp",
        "price": "19.99",
        "quantity": 5,
        "categories": [category.id],
    });

    let customer_token = app.token("jane@example.com").await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/products",
        Some(&customer_token),
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error_code"], "UNAUTHORIZED");

    let admin_token = app.token("admin@example.com").await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/products",
        Some(&admin_token),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Product created successfully");
    assert_eq!(body["data"]["name"], "Desk Lamp");
    assert_eq!(body["data"]["slug"], "desk-lamp");
    assert_eq!(body["data"]["price_formatted"], "19.99 $");
    assert_eq!(body["data"]["categories"][0]["slug"], "office");

    // Public read of the same product
    let (status, body) = send(&app, Method::GET, "/v1/products/desk-lamp", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "active");
}

#[tokio::test]
async fn test_product_validation_and_missing_resources() {
    let app = setup().await;
    app.admin().await;
    let token = app.token("admin@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/products",
        Some(&token),
        Some(json!({ "name": "x", "price": "-1", "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["name"].is_array());
    assert!(body["errors"]["price"].is_array());
    assert!(body["errors"]["categories"].is_array());

    let (status, body) = send(&app, Method::GET, "/v1/products/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_list_pagination_links_are_absolute() {
    let app = setup().await;
    let admin = app.admin().await;
    for name in ["Office", "Garden", "Kitchen"] {
        app.category(&admin, name).await;
    }

    let (status, body) = send(&app, Method::GET, "/v1/categories?per_page=2", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(
        body["pagination"]["next_page_url"],
        "http://shop.test/v1/categories?per_page=2&page=2"
    );
    assert!(body["pagination"]["prev_page_url"].is_null());
}

#[tokio::test]
async fn test_cart_and_order_flow() {
    let app = setup().await;
    let admin = app.admin().await;
    app.customer("jane@example.com").await;
    let category = app.category(&admin, "Office").await;
    let lamp = app.product(&admin, "Desk Lamp", dec!(10.00), 5, &[category.id]).await;
    let token = app.token("jane@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/cart",
        Some(&token),
        Some(json!({ "product_id": lamp.product.id, "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Product added to cart successfully");
    assert_eq!(body["data"]["items"][0]["quantity"], 2);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/orders",
        Some(&token),
        Some(json!({ "items": [{ "product_id": lamp.product.id, "quantity": 2 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "pending");
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/v1/orders/{}/cancel", order_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/v1/orders/{}/cancel", order_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "BAD_REQUEST");
    assert_eq!(body["message"], "Order is already cancelled.");
}

#[tokio::test]
async fn test_order_requires_items() {
    let app = setup().await;
    app.customer("jane@example.com").await;
    let token = app.token("jane@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/orders",
        Some(&token),
        Some(json!({ "items": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["items"][0], "The Items field is required.");
}

#[tokio::test]
async fn test_orders_are_scoped_to_their_owner() {
    let app = setup().await;
    let admin = app.admin().await;
    let jane = app.customer("jane@example.com").await;
    app.customer("john@example.com").await;
    let category = app.category(&admin, "Office").await;
    let lamp = app.product(&admin, "Desk Lamp", dec!(10.00), 5, &[category.id]).await;

    let order = app
        .services
        .orders()
        .create(
            &jane,
            vec![OrderLineRequest {
                product_id: lamp.product.id,
                quantity: 1,
            }],
        )
        .await
        .unwrap();

    let john = app.token("john@example.com").await;
    let (status, body) = send(&app, Method::GET, "/v1/orders", Some(&john), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 0);

    let uri = format!("/v1/orders/{}", order.order.id);
    let (status, body) = send(&app, Method::GET, &uri, Some(&john), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error_code"], "UNAUTHORIZED");

    let admin_token = app.token("admin@example.com").await;
    let (status, _) = send(&app, Method::GET, &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/v1/orders/not-a-uuid", Some(&john), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rate_limit_headers_are_set() {
    let app = setup().await;

    let request = Request::builder()
        .uri("/v1/products")
        .body(Body::empty())
        .unwrap();
    let response = router(&app).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-ratelimit-limit"));
    assert!(response.headers().contains_key("x-ratelimit-remaining"));
}
