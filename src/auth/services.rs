use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::users::repo::User;

use super::jwt::{Claims, JwtKeys};
use super::password::verify_password;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Checks credentials and issues a token for the matched user. Unknown email
/// and wrong password produce the same error kind, so a caller cannot probe
/// which of the two failed.
pub async fn login(
    db: &SqlitePool,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> Result<String, ApiError> {
    let user = User::find_by_email(db, email)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let ok = verify_password(password, &user.password_hash)?;
    if !ok {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::not_found("User not found"));
    }

    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(token)
}

/// Turns a verified token payload back into a live user record. Re-checks
/// existence, so a deleted user's token stops resolving before it expires.
pub async fn resolve_user(db: &SqlitePool, claims: &Claims) -> Result<User, ApiError> {
    let id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| ApiError::not_found("User not found"))?;
    User::find_by_id(db, id).await
}
