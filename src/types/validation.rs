//! Structured per-field validation messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::errors::{AppError, AppResult};

/// Field name to list of messages, e.g. `{"items.0.quantity": ["..."]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single failing field.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error.
    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }

    fn collect(&mut self, prefix: Option<&str>, errors: &ValidationErrors) {
        for (field, kind) in errors.errors() {
            let path = match prefix {
                Some(prefix) => format!("{}.{}", prefix, field),
                None => field.to_string(),
            };

            match kind {
                ValidationErrorsKind::Field(list) => {
                    for error in list {
                        let message = error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("The {} field is invalid.", path));
                        self.add(path.clone(), message);
                    }
                }
                ValidationErrorsKind::Struct(nested) => self.collect(Some(&path), nested),
                ValidationErrorsKind::List(entries) => {
                    for (index, nested) in entries {
                        self.collect(Some(&format!("{}.{}", path, index)), nested);
                    }
                }
            }
        }
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        fields.collect(None, errors);
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use validator::Validate;

    #[derive(Debug, Deserialize, Validate)]
    struct Line {
        #[validate(range(min = 1, message = "Quantity must be at least 1."))]
        quantity: i32,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Basket {
        #[validate(length(min = 3, message = "Name is too short."))]
        name: String,
        #[validate(nested)]
        lines: Vec<Line>,
    }

    #[test]
    fn test_flattens_nested_list_errors() {
        let basket = Basket {
            name: "ab".to_string(),
            lines: vec![Line { quantity: 2 }, Line { quantity: 0 }],
        };
        let errors = basket.validate().unwrap_err();
        let fields = FieldErrors::from(&errors);

        assert_eq!(fields.get("name"), Some(&["Name is too short.".to_string()][..]));
        assert_eq!(
            fields.get("lines.1.quantity"),
            Some(&["Quantity must be at least 1.".to_string()][..])
        );
        assert!(fields.get("lines.0.quantity").is_none());
    }

    #[test]
    fn test_into_result() {
        assert!(FieldErrors::new().into_result().is_ok());

        let err = FieldErrors::single("email", "taken").into_result().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut errors = FieldErrors::new();
        errors.add("email", "first");
        errors.add("email", "second");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({"email": ["first", "second"]}));
    }
}
