use serde::Serialize;
use sqlx::sqlite::SqliteConnection;
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

use crate::error::ApiError;
use crate::products::repo::Product;
use crate::users::repo::User;

/// Sale row. `user_id` goes NULL when the owning user is deleted; the sale
/// itself is never cascade-deleted.
#[derive(Debug, Clone, FromRow)]
pub struct Sale {
    pub id: i64,
    pub user_id: Option<i64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Sale with its user and products eagerly resolved, as returned to callers.
#[derive(Debug, Serialize)]
pub struct SaleDetails {
    pub id: i64,
    pub user: Option<User>,
    pub products: Vec<Product>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Changes applied by a sale update; absent fields keep their stored value.
#[derive(Debug, Default)]
pub struct SaleChanges {
    pub user_id: Option<i64>,
    pub product_ids: Option<Vec<i64>>,
}

impl Sale {
    /// Resolves the user and the product set, then persists the sale and its
    /// join rows in one transaction. Product ids that do not resolve are
    /// dropped; only a fully-unresolvable set is rejected, and then nothing
    /// is persisted.
    pub async fn create(
        db: &SqlitePool,
        user_id: i64,
        product_ids: &[i64],
    ) -> Result<SaleDetails, ApiError> {
        let mut tx = db.begin().await?;

        let user = User::find_by_id(&mut *tx, user_id).await?;
        let products = Product::find_by_ids(&mut *tx, product_ids).await?;
        if products.is_empty() {
            return Err(ApiError::not_found("Product IDs not found"));
        }

        let now = OffsetDateTime::now_utc();
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (user_id, created_at, updated_at)
            VALUES (?, ?, ?)
            RETURNING id, user_id, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        link_products(&mut tx, sale.id, &products).await?;
        tx.commit().await?;

        Ok(SaleDetails {
            id: sale.id,
            user: Some(user),
            products,
            created_at: sale.created_at,
            updated_at: sale.updated_at,
        })
    }

    pub async fn find_all(
        db: &SqlitePool,
        owner: Option<i64>,
    ) -> Result<Vec<SaleDetails>, ApiError> {
        let sales = match owner {
            Some(user_id) => {
                sqlx::query_as::<_, Sale>(
                    r#"
                    SELECT id, user_id, created_at, updated_at
                    FROM sales
                    WHERE user_id = ?
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(user_id)
                .fetch_all(db)
                .await?
            }
            None => {
                sqlx::query_as::<_, Sale>(
                    r#"
                    SELECT id, user_id, created_at, updated_at
                    FROM sales
                    ORDER BY created_at DESC
                    "#,
                )
                .fetch_all(db)
                .await?
            }
        };

        let mut conn = db.acquire().await?;
        let mut details = Vec::with_capacity(sales.len());
        for sale in sales {
            details.push(load_details(&mut conn, sale).await?);
        }
        Ok(details)
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> Result<SaleDetails, ApiError> {
        let mut conn = db.acquire().await?;
        let sale = fetch_sale(&mut conn, id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Sale ID {id} not found")))?;
        load_details(&mut conn, sale).await
    }

    /// Re-resolves any provided references and merges them into the record;
    /// a provided product set replaces the previous one wholesale.
    pub async fn update(db: &SqlitePool, id: i64, changes: SaleChanges) -> Result<SaleDetails, ApiError> {
        let mut tx = db.begin().await?;

        let sale = fetch_sale(&mut tx, id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Sale ID {id} not found")))?;

        let mut user_id = sale.user_id;
        if let Some(uid) = changes.user_id {
            User::find_by_id(&mut *tx, uid).await?;
            user_id = Some(uid);
        }

        if let Some(ids) = &changes.product_ids {
            let products = Product::find_by_ids(&mut *tx, ids).await?;
            if products.is_empty() {
                return Err(ApiError::not_found("Product IDs not found"));
            }
            sqlx::query("DELETE FROM sale_products WHERE sale_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            link_products(&mut tx, id, &products).await?;
        }

        let now = OffsetDateTime::now_utc();
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales
            SET user_id = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, user_id, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let details = load_details(&mut tx, sale).await?;
        tx.commit().await?;
        Ok(details)
    }

    /// Deletes the sale (join rows cascade) and returns the pre-delete
    /// snapshot with relations resolved.
    pub async fn remove(db: &SqlitePool, id: i64) -> Result<SaleDetails, ApiError> {
        let mut tx = db.begin().await?;
        let sale = fetch_sale(&mut tx, id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Sale ID {id} not found")))?;
        let details = load_details(&mut tx, sale).await?;

        sqlx::query("DELETE FROM sales WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(details)
    }
}

async fn fetch_sale(conn: &mut SqliteConnection, id: i64) -> Result<Option<Sale>, ApiError> {
    let sale = sqlx::query_as::<_, Sale>(
        r#"
        SELECT id, user_id, created_at, updated_at
        FROM sales
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(sale)
}

async fn link_products(
    conn: &mut SqliteConnection,
    sale_id: i64,
    products: &[Product],
) -> Result<(), ApiError> {
    for product in products {
        sqlx::query("INSERT INTO sale_products (sale_id, product_id) VALUES (?, ?)")
            .bind(sale_id)
            .bind(product.id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn load_details(conn: &mut SqliteConnection, sale: Sale) -> Result<SaleDetails, ApiError> {
    let user = match sale.user_id {
        Some(user_id) => Some(User::find_by_id(&mut *conn, user_id).await?),
        None => None,
    };
    let products = sqlx::query_as::<_, Product>(
        r#"
        SELECT p.id, p.code, p.name, p.price, p.created_at, p.updated_at
        FROM products p
        JOIN sale_products sp ON sp.product_id = p.id
        WHERE sp.sale_id = ?
        ORDER BY p.id
        "#,
    )
    .bind(sale.id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(SaleDetails {
        id: sale.id,
        user,
        products,
        created_at: sale.created_at,
        updated_at: sale.updated_at,
    })
}
