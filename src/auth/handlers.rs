use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};

use crate::error::{ApiError, FieldError};
use crate::state::AppState;

use super::dto::{LoginRequest, TokenResponse};
use super::jwt::JwtKeys;
use super::services::{is_valid_email, login};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth", post(authenticate))
}

#[instrument(skip(state, payload))]
pub async fn authenticate(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "login with malformed email");
        return Err(ApiError::Validation(vec![FieldError {
            field: "email",
            message: "email must be a valid address".into(),
        }]));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = login(&state.db, &keys, &payload.email, &payload.password).await?;
    Ok(Json(TokenResponse { token }))
}
