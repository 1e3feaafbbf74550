use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the catalog tables and text index. Safe to run repeatedly.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // One row per artefact directory; the full document is kept as JSON.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artefacts (
            id TEXT PRIMARY KEY,
            directory_path TEXT NOT NULL,
            artefact_type TEXT,
            sort_name TEXT NOT NULL,
            document_json TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Text index: one row per (artefact, language). FTS5 CREATE is not
    // idempotent natively, so we check first.
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='artefacts_fts'",
    )
    .fetch_one(pool)
    .await?;

    if !fts_exists {
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE artefacts_fts USING fts5(
                artefact_id UNINDEXED,
                lang UNINDEXED,
                name,
                description,
                keywords,
                name_folded UNINDEXED,
                description_folded UNINDEXED,
                tokenize = 'unicode61 remove_diacritics 2'
            )
            "#,
        )
        .execute(pool)
        .await?;
    }

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_artefacts_sort ON artefacts(sort_name, id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_artefacts_type ON artefacts(artefact_type)")
        .execute(pool)
        .await?;

    Ok(())
}
