//! Validated JSON extractor - Combines deserialization with validation.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::errors::AppError;
use crate::types::FieldErrors;

/// Validated JSON extractor that automatically validates requests.
///
/// Malformed bodies are reported as a validation error on `body`; rule
/// violations become per-field errors keyed by their JSON path
/// (`items.0.quantity`).
///
/// # Example
///
/// ```rust,ignore
/// use serde::Deserialize;
/// use validator::Validate;
/// use storefront_api::api::extractors::ValidatedJson;
///
/// #[derive(Deserialize, Validate)]
/// struct AddToCart {
///     #[validate(range(min = 1))]
///     quantity: i32,
/// }
///
/// async fn add(ValidatedJson(payload): ValidatedJson<AddToCart>) {
///     // payload is already validated
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation("body", e.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::Validation(FieldErrors::from(&e)))?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(range(min = 1, message = "The quantity field must be at least 1."))]
        quantity: i32,
    }

    fn request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_rule_violation_is_keyed_by_field() {
        let result = ValidatedJson::<Payload>::from_request(request(r#"{"quantity":0}"#), &()).await;

        match result {
            Err(AppError::Validation(errors)) => assert_eq!(
                errors.get("quantity"),
                Some(&["The quantity field must be at least 1.".to_string()][..])
            ),
            _ => panic!("expected a validation error"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_reported_on_body() {
        let result = ValidatedJson::<Payload>::from_request(request("{not json"), &()).await;

        match result {
            Err(AppError::Validation(errors)) => assert!(errors.get("body").is_some()),
            _ => panic!("expected a validation error"),
        }
    }
}
