use serde::Serialize;
use sqlx::{FromRow, SqlitePool, SqliteExecutor};
use time::OffsetDateTime;

use crate::error::{conflict_on_unique, ApiError};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub price: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default)]
pub struct ProductPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
}

impl Product {
    pub async fn create(
        db: &SqlitePool,
        code: &str,
        name: &str,
        price: f64,
    ) -> Result<Product, ApiError> {
        let now = OffsetDateTime::now_utc();
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (code, name, price, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, code, name, price, created_at, updated_at
            "#,
        )
        .bind(code)
        .bind(name)
        .bind(price)
        .bind(now)
        .bind(now)
        .fetch_one(db)
        .await
        .map_err(|e| conflict_on_unique(e, "Product code already in use"))?;
        Ok(product)
    }

    pub async fn find_all(db: &SqlitePool) -> Result<Vec<Product>, ApiError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, price, created_at, updated_at
            FROM products
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(products)
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> Result<Product, ApiError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, price, created_at, updated_at
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product ID {id} not found")))?;
        Ok(product)
    }

    /// Resolves the subset of `ids` that exist. Used by the sale store inside
    /// its transaction, hence the executor parameter.
    pub async fn find_by_ids<'e, E>(executor: E, ids: &[i64]) -> Result<Vec<Product>, ApiError>
    where
        E: SqliteExecutor<'e>,
    {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
            "SELECT id, code, name, price, created_at, updated_at FROM products WHERE id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        builder.push(")");
        let products = builder
            .build_query_as::<Product>()
            .fetch_all(executor)
            .await?;
        Ok(products)
    }

    pub async fn update(db: &SqlitePool, id: i64, patch: ProductPatch) -> Result<Product, ApiError> {
        let mut tx = db.begin().await?;
        let current = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, price, created_at, updated_at
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product ID {id} not found")))?;

        let code = patch.code.unwrap_or(current.code);
        let name = patch.name.unwrap_or(current.name);
        let price = patch.price.unwrap_or(current.price);
        let now = OffsetDateTime::now_utc();

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET code = ?, name = ?, price = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, code, name, price, created_at, updated_at
            "#,
        )
        .bind(&code)
        .bind(&name)
        .bind(price)
        .bind(now)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "Product code already in use"))?;
        tx.commit().await?;
        Ok(product)
    }

    /// Deletes the record and returns the pre-delete snapshot.
    pub async fn remove(db: &SqlitePool, id: i64) -> Result<Product, ApiError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            DELETE FROM products
            WHERE id = ?
            RETURNING id, code, name, price, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product ID {id} not found")))?;
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    async fn seed(db: &SqlitePool, code: &str) -> Product {
        Product::create(db, code, "Coffee 250g", 12.5)
            .await
            .expect("seed product")
    }

    #[tokio::test]
    async fn duplicate_code_is_a_conflict() {
        let state = AppState::for_tests().await;
        seed(&state.db, "SKU-1").await;
        let err = Product::create(&state.db, "SKU-1", "Other", 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_merges_fields_and_bumps_updated_at() {
        let state = AppState::for_tests().await;
        let product = seed(&state.db, "SKU-1").await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let patch = ProductPatch {
            price: Some(14.0),
            ..Default::default()
        };
        let updated = Product::update(&state.db, product.id, patch)
            .await
            .expect("update");
        assert_eq!(updated.price, 14.0);
        assert_eq!(updated.code, "SKU-1");
        assert_eq!(updated.name, product.name);
        assert!(updated.updated_at > product.updated_at);
    }

    #[tokio::test]
    async fn remove_returns_snapshot_then_not_found() {
        let state = AppState::for_tests().await;
        let product = seed(&state.db, "SKU-1").await;
        let removed = Product::remove(&state.db, product.id).await.expect("remove");
        assert_eq!(removed.code, "SKU-1");
        let err = Product::find_by_id(&state.db, product.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn find_by_ids_returns_only_existing_rows() {
        let state = AppState::for_tests().await;
        let first = seed(&state.db, "SKU-1").await;
        let second = seed(&state.db, "SKU-2").await;

        let found = Product::find_by_ids(&state.db, &[first.id, 999, second.id])
            .await
            .expect("query");
        let mut ids: Vec<_> = found.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![first.id, second.id]);

        assert!(Product::find_by_ids(&state.db, &[])
            .await
            .expect("query")
            .is_empty());
    }
}
