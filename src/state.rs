use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::db;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_path).await?;
        Ok(Self { db, config })
    }
}

#[cfg(test)]
impl AppState {
    /// State backed by a fresh in-memory database with the schema applied.
    /// In-memory SQLite is per-connection, so the pool is capped at one.
    pub async fn for_tests() -> Self {
        use std::str::FromStr;

        use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

        use crate::config::JwtConfig;

        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .expect("in-memory options")
            .foreign_keys(true);
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("in-memory pool");
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("apply migrations");

        let config = Arc::new(AppConfig {
            database_path: ":memory:".into(),
            jwt: JwtConfig {
                secret: "test-secret".into(),
                ttl_minutes: 5,
            },
        });
        Self { db, config }
    }
}
