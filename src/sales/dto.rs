use serde::Deserialize;

use crate::error::{ApiError, FieldError};

use super::repo::SaleChanges;

/// Wire format carries string-encoded ids.
#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub user: String,
    pub products: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSaleRequest {
    pub user: Option<String>,
    pub products: Option<Vec<String>>,
}

/// Typed filter for sale listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListSalesQuery {
    pub user: Option<i64>,
}

fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

fn parse_id_list(raw: &[String], errors: &mut Vec<FieldError>) -> Vec<i64> {
    if raw.is_empty() {
        errors.push(FieldError {
            field: "products",
            message: "at least one product is required".into(),
        });
        return Vec::new();
    }
    let mut ids = Vec::with_capacity(raw.len());
    for value in raw {
        match parse_id(value) {
            Some(id) => ids.push(id),
            None => {
                errors.push(FieldError {
                    field: "products",
                    message: format!("product id '{value}' must be numeric"),
                });
            }
        }
    }
    ids
}

impl CreateSaleRequest {
    pub fn validate(&self) -> Result<(i64, Vec<i64>), ApiError> {
        let mut errors = Vec::new();
        let user = parse_id(&self.user);
        if user.is_none() {
            errors.push(FieldError {
                field: "user",
                message: "user must be a numeric id".into(),
            });
        }
        let products = parse_id_list(&self.products, &mut errors);
        if errors.is_empty() {
            Ok((user.unwrap(), products))
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

impl UpdateSaleRequest {
    pub fn validate(&self) -> Result<SaleChanges, ApiError> {
        let mut errors = Vec::new();
        let user_id = match &self.user {
            Some(raw) => {
                let parsed = parse_id(raw);
                if parsed.is_none() {
                    errors.push(FieldError {
                        field: "user",
                        message: "user must be a numeric id".into(),
                    });
                }
                parsed
            }
            None => None,
        };
        let product_ids = match &self.products {
            Some(raw) => Some(parse_id_list(raw, &mut errors)),
            None => None,
        };
        if errors.is_empty() {
            Ok(SaleChanges {
                user_id,
                product_ids,
            })
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_parses_string_ids() {
        let payload = CreateSaleRequest {
            user: "7".into(),
            products: vec!["1".into(), "2".into()],
        };
        let (user, products) = payload.validate().expect("valid");
        assert_eq!(user, 7);
        assert_eq!(products, vec![1, 2]);
    }

    #[test]
    fn create_request_rejects_empty_products_and_bad_user() {
        let payload = CreateSaleRequest {
            user: "abc".into(),
            products: vec![],
        };
        let err = payload.validate().unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["user", "products"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn update_request_passes_through_absent_fields() {
        let payload = UpdateSaleRequest {
            user: None,
            products: None,
        };
        let changes = payload.validate().expect("valid");
        assert!(changes.user_id.is_none());
        assert!(changes.product_ids.is_none());
    }
}
