//! JWT authentication middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::api::AppState;
use crate::domain::Actor;
use crate::errors::AppError;

/// JWT authentication middleware.
///
/// Verifies the bearer token (signature, expiry and revocation), then
/// injects the token's `Claims` and the derived `Actor` into the request
/// extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::Unauthenticated)?;

    let claims = state.services.auth().verify_token(bearer.token()).await?;
    let actor = claims.actor();

    request.extensions_mut().insert(actor);
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Reject non-admin callers before the handler runs.
///
/// Must sit inside `auth_middleware`.
pub async fn admin_only(request: Request, next: Next) -> Result<Response, AppError> {
    let actor = request
        .extensions()
        .get::<Actor>()
        .ok_or(AppError::Unauthenticated)?;

    if !actor.is_admin() {
        tracing::warn!(user_id = %actor.id, path = %request.uri().path(), "Admin route refused");
        return Err(AppError::forbidden(""));
    }

    Ok(next.run(request).await)
}
