use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// Opens the SQLite pool for the given database file.
///
/// WAL mode keeps readers from blocking the writer; foreign keys are enabled
/// explicitly because SQLite ships with them off.
pub async fn connect(database_path: &str) -> anyhow::Result<SqlitePool> {
    let url = format!("sqlite://{}?mode=rwc", database_path);
    let options = SqliteConnectOptions::from_str(&url)
        .with_context(|| format!("invalid database path {database_path}"))?
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await
        .context("connect to database")?;

    info!(path = %database_path, "database pool created");
    Ok(pool)
}
