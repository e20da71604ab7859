//! Application route configuration.

use axum::{extract::State, http::StatusCode, middleware, response::Json, routing::get, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    auth_routes, cart_routes, category_admin_routes, category_routes, order_routes,
    product_admin_routes, product_routes, session_routes,
};
use super::middleware::{admin_only, auth_middleware, rate_limit_middleware};
use super::openapi::ApiDoc;
use super::AppState;
use crate::config::API_PREFIX;

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .merge(auth_routes())
        .nest("/products", product_routes())
        .nest("/categories", category_routes());

    let authenticated = Router::new()
        .merge(session_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Layers run outside-in: authenticate, then check the role
    let admin = Router::new()
        .nest("/products", product_admin_routes())
        .nest("/categories", category_admin_routes())
        .route_layer(middleware::from_fn(admin_only))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api = public
        .merge(authenticated)
        .merge(admin)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        // Health check endpoints (no rate limiting)
        .route("/", get(root))
        .route("/health", get(health))
        // OpenAPI Swagger UI documentation
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest(API_PREFIX, api)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Storefront API"
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    services: ServiceHealth,
}

/// Individual service health status
#[derive(Serialize)]
struct ServiceHealth {
    database: ServiceStatus,
    cache: ServiceStatus,
}

/// Service status; failure details go to the log only
#[derive(Serialize)]
struct ServiceStatus {
    status: &'static str,
}

impl ServiceStatus {
    fn from_result<E: std::fmt::Display>(service: &str, result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self { status: "healthy" },
            Err(e) => {
                tracing::error!(service, error = %e, "Health check failed");
                Self {
                    status: "unhealthy",
                }
            }
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Health check endpoint with database and cache connectivity check
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (database, cache) = futures::join!(state.database.ping(), state.cache.exists("health:ping"));
    let database = ServiceStatus::from_result("database", database);
    let cache = ServiceStatus::from_result("cache", cache.map(|_| ()));

    let all_healthy = database.is_healthy() && cache.is_healthy();
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" },
        services: ServiceHealth { database, cache },
    };

    (status_code, Json(response))
}
