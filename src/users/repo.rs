use serde::Serialize;
use sqlx::{FromRow, SqliteExecutor, SqlitePool};
use time::OffsetDateTime;

use crate::error::{conflict_on_unique, ApiError};

/// User record. The password hash never leaves the process in a response
/// body; it is only read back by the auth service for credential checks.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl User {
    pub async fn create(
        db: &SqlitePool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ApiError> {
        let now = OffsetDateTime::now_utc();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(db)
        .await
        .map_err(|e| conflict_on_unique(e, "Email already in use"))?;
        Ok(user)
    }

    pub async fn find_all(db: &SqlitePool) -> Result<Vec<User>, ApiError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Also used by the sale store inside its transaction, hence the
    /// executor parameter.
    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<User, ApiError>
    where
        E: SqliteExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User ID {id} not found")))?;
        Ok(user)
    }

    /// Lookup for the auth service; the returned record includes the hash.
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn update(db: &SqlitePool, id: i64, patch: UserPatch) -> Result<User, ApiError> {
        let mut tx = db.begin().await?;
        let current = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User ID {id} not found")))?;

        let name = patch.name.unwrap_or(current.name);
        let email = patch.email.unwrap_or(current.email);
        let password_hash = patch.password_hash.unwrap_or(current.password_hash);
        let now = OffsetDateTime::now_utc();

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = ?, email = ?, password_hash = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(&email)
        .bind(&password_hash)
        .bind(now)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Email already in use"))?;
        tx.commit().await?;
        Ok(user)
    }

    /// Deletes the record and returns the pre-delete snapshot.
    pub async fn remove(db: &SqlitePool, id: i64) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            DELETE FROM users
            WHERE id = ?
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User ID {id} not found")))?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    async fn seed(db: &SqlitePool, email: &str) -> User {
        User::create(db, "seed", email, "argon2-hash")
            .await
            .expect("seed user")
    }

    #[tokio::test]
    async fn created_user_is_refetchable_by_id() {
        let state = AppState::for_tests().await;
        let user = seed(&state.db, "a@x.com").await;
        let found = User::find_by_id(&state.db, user.id).await.expect("find");
        assert_eq!(found.id, user.id);
        assert_eq!(found.email, "a@x.com");
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let state = AppState::for_tests().await;
        seed(&state.db, "a@x.com").await;
        let err = User::create(&state.db, "other", "a@x.com", "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_merges_fields_and_bumps_updated_at() {
        let state = AppState::for_tests().await;
        let user = seed(&state.db, "a@x.com").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let patch = UserPatch {
            name: Some("renamed".into()),
            ..Default::default()
        };
        let updated = User::update(&state.db, user.id, patch).await.expect("update");
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.email, user.email);
        assert_eq!(updated.password_hash, user.password_hash);
        assert!(updated.updated_at > user.updated_at);

        let refetched = User::find_by_id(&state.db, user.id).await.expect("find");
        assert_eq!(refetched.name, "renamed");
    }

    #[tokio::test]
    async fn update_missing_user_is_not_found() {
        let state = AppState::for_tests().await;
        let err = User::update(&state.db, 999, UserPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_to_taken_email_is_a_conflict() {
        let state = AppState::for_tests().await;
        seed(&state.db, "a@x.com").await;
        let second = seed(&state.db, "b@x.com").await;
        let patch = UserPatch {
            email: Some("a@x.com".into()),
            ..Default::default()
        };
        let err = User::update(&state.db, second.id, patch).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn remove_returns_snapshot_then_not_found() {
        let state = AppState::for_tests().await;
        let user = seed(&state.db, "a@x.com").await;
        let removed = User::remove(&state.db, user.id).await.expect("remove");
        assert_eq!(removed.email, "a@x.com");
        let err = User::find_by_id(&state.db, user.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn find_by_email_includes_hash() {
        let state = AppState::for_tests().await;
        seed(&state.db, "a@x.com").await;
        let user = User::find_by_email(&state.db, "a@x.com")
            .await
            .expect("query")
            .expect("present");
        assert_eq!(user.password_hash, "argon2-hash");
        assert!(User::find_by_email(&state.db, "b@x.com")
            .await
            .expect("query")
            .is_none());
    }
}
