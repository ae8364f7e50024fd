//! Ranking store connections
//!
//! The service only reads the ranking tables, so its pool is opened
//! read-only. The importer opens a writable pool and creates the schema.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, info};

/// Read-only pool used by the service
pub async fn connect_readonly(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    debug!("Connecting to ranking store: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database URL: {}", database_url))?
        .read_only(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open ranking store {}", database_url))?;

    info!(max_connections, "Ranking store connected (read-only)");
    Ok(pool)
}

/// Writable pool used by the importer; creates the file when missing
pub async fn connect_writable(database_url: &str) -> Result<SqlitePool> {
    debug!("Opening ranking store for import: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database URL: {}", database_url))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open ranking store {}", database_url))?;

    wkrec_common::db::create_ranking_schema(&pool).await?;
    Ok(pool)
}
