//! Ranking store schema
//!
//! Two tables: `language` (code lookup) and `article_recommendation`
//! (per-entity normalized rank for a source/target language pair). The
//! recommendation service only reads them; the importer and tests create them.

use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Create the ranking tables if they do not exist (idempotent)
pub async fn create_ranking_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS language (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS article_recommendation (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            wikidata_id INTEGER NOT NULL,
            normalized_rank REAL NOT NULL,
            source_id INTEGER NOT NULL REFERENCES language(id),
            target_id INTEGER NOT NULL REFERENCES language(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_article_recommendation_target \
         ON article_recommendation (target_id, wikidata_id)",
    )
    .execute(pool)
    .await?;

    info!("Ranking schema ready");
    Ok(())
}

/// Look up a language id by code
pub async fn language_id(pool: &SqlitePool, code: &str) -> Result<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM language WHERE code = ? LIMIT 1")
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let pool = memory_pool().await;
        create_ranking_schema(&pool).await.unwrap();
        create_ranking_schema(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
             AND name IN ('language', 'article_recommendation')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_language_id_lookup() {
        let pool = memory_pool().await;
        create_ranking_schema(&pool).await.unwrap();
        sqlx::query("INSERT INTO language (code) VALUES ('en'), ('uz')")
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(language_id(&pool, "uz").await.unwrap(), Some(2));
        assert_eq!(language_id(&pool, "xx").await.unwrap(), None);
    }
}
