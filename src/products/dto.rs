use serde::Deserialize;

use crate::error::{ApiError, FieldError};

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub code: String,
    pub name: String,
    pub price: f64,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if self.code.trim().is_empty() {
            errors.push(FieldError {
                field: "code",
                message: "code is required".into(),
            });
        }
        if self.name.trim().is_empty() {
            errors.push(FieldError {
                field: "name",
                message: "name is required".into(),
            });
        }
        if !self.price.is_finite() || self.price < 0.0 {
            errors.push(FieldError {
                field: "price",
                message: "price must be a non-negative number".into(),
            });
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if let Some(code) = &self.code {
            if code.trim().is_empty() {
                errors.push(FieldError {
                    field: "code",
                    message: "code must not be empty".into(),
                });
            }
        }
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                errors.push(FieldError {
                    field: "name",
                    message: "name must not be empty".into(),
                });
            }
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                errors.push(FieldError {
                    field: "price",
                    message: "price must be a non-negative number".into(),
                });
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}
