use serde::Deserialize;

use crate::auth::services::is_valid_email;
use crate::error::{ApiError, FieldError};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError {
                field: "name",
                message: "name is required".into(),
            });
        }
        if !is_valid_email(&self.email) {
            errors.push(FieldError {
                field: "email",
                message: "email must be a valid address".into(),
            });
        }
        if self.password.len() < 8 {
            errors.push(FieldError {
                field: "password",
                message: "password must be at least 8 characters".into(),
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
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                errors.push(FieldError {
                    field: "name",
                    message: "name must not be empty".into(),
                });
            }
        }
        if let Some(email) = &self.email {
            if !is_valid_email(email) {
                errors.push(FieldError {
                    field: "email",
                    message: "email must be a valid address".into(),
                });
            }
        }
        if let Some(password) = &self.password {
            if password.len() < 8 {
                errors.push(FieldError {
                    field: "password",
                    message: "password must be at least 8 characters".into(),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_aggregates_field_errors() {
        let payload = CreateUserRequest {
            name: "  ".into(),
            email: "not-an-email".into(),
            password: "short".into(),
        };
        let err = payload.validate().unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["name", "email", "password"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn update_request_allows_absent_fields() {
        let payload = UpdateUserRequest {
            name: None,
            email: None,
            password: None,
        };
        assert!(payload.validate().is_ok());
    }
}
