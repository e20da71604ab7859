//! Authentication handlers.

use axum::{extract::State, response::Json, routing::post, Extension, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::errors::AppResult;
use crate::services::{AuthResponse, Claims};
use crate::types::{ApiResponse, Created};

/// User registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// User display name
    #[validate(length(
        min = 3,
        max = 100,
        message = "The Name field must be between 3 and 100 characters."
    ))]
    #[schema(example = "Jane Doe")]
    pub name: String,
    /// User email address
    #[validate(
        email(message = "The Email Address field must be a valid email address."),
        length(max = 255, message = "The Email Address field must not be greater than 255 characters.")
    )]
    #[schema(example = "jane@example.com")]
    pub email: String,
    /// Password (8 to 30 characters)
    #[validate(
        length(min = 8, max = 30, message = "The Password field must be between 8 and 30 characters."),
        must_match(other = "password_confirmation", message = "The Password field confirmation does not match.")
    )]
    #[schema(example = "SecurePass123!", min_length = 8, max_length = 30)]
    pub password: String,
    #[schema(example = "SecurePass123!")]
    pub password_confirmation: String,
}

/// User login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// User email address
    #[validate(email(message = "The Email Address field must be a valid email address."))]
    #[schema(example = "jane@example.com")]
    pub email: String,
    /// User password
    #[validate(length(min = 1, message = "The Password field is required."))]
    #[schema(example = "SecurePass123!")]
    pub password: String,
}

/// Public authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Routes that need a valid bearer token
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/logout", post(logout))
}

/// Register a new customer account
#[utoipa::path(
    post,
    path = "/v1/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered successfully!", body = AuthResponse),
        (status = 422, description = "Validation error")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<Created<AuthResponse>> {
    let auth = state
        .services
        .auth()
        .register(payload.name, payload.email, payload.password)
        .await?;

    Ok(Created(ApiResponse::with_message(
        auth,
        "Registered successfully!",
    )))
}

/// Login and get a bearer token
#[utoipa::path(
    post,
    path = "/v1/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in successfully", body = AuthResponse),
        (status = 422, description = "Invalid credentials or validation error")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    let auth = state
        .services
        .auth()
        .login(payload.email, payload.password)
        .await?;

    Ok(Json(ApiResponse::with_message(auth, "Logged in successfully")))
}

/// Revoke the presented token
#[utoipa::path(
    post,
    path = "/v1/logout",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out successfully"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.services.auth().logout(&claims).await?;
    Ok(Json(ApiResponse::message("Logged out successfully")))
}
