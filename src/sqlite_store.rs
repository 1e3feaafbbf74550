//! SQLite-backed [`ArtefactStore`] implementation.
//!
//! Documents are stored whole as JSON in `artefacts`; the FTS5 table
//! `artefacts_fts` holds one row per (artefact, language) with the
//! localized name, description and keywords. Every document write
//! replaces the row and its text rows in a single transaction, so a
//! concurrent reader sees either the old or the new version.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::models::{fold_text, ArtefactDocument, ArtefactFilter, Language};
use crate::search::{fts_query, like_prefix_pattern};
use crate::service::{DataStoreService, ServiceSettings};
use crate::store::{ArtefactStore, Page};

/// BM25 column weights, in `artefacts_fts` column order. Name matches
/// count most, then keywords, then description.
const BM25_WEIGHTS: &str = "0.0, 0.0, 10.0, 2.0, 5.0, 0.0, 0.0";

/// Upper bound on ids bound into a single `IN (...)` list.
const DELETE_BATCH: usize = 500;

/// SQLite implementation of the [`ArtefactStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn upsert_one(&self, doc: &ArtefactDocument) -> Result<()> {
        let document_json = serde_json::to_string(doc)?;
        let now = chrono::Utc::now().timestamp();

        let mut tx = self.pool.begin().await?;

        // updated_at only moves when the stored document actually changes.
        sqlx::query(
            r#"
            INSERT INTO artefacts (id, directory_path, artefact_type, sort_name, document_json, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                directory_path = excluded.directory_path,
                artefact_type = excluded.artefact_type,
                sort_name = excluded.sort_name,
                updated_at = CASE
                    WHEN artefacts.document_json = excluded.document_json THEN artefacts.updated_at
                    ELSE excluded.updated_at
                END,
                document_json = excluded.document_json
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.directory_path)
        .bind(doc.artefact_type.map(|t| t.as_str()))
        .bind(doc.sort_name())
        .bind(&document_json)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM artefacts_fts WHERE artefact_id = ?")
            .bind(&doc.id)
            .execute(&mut *tx)
            .await?;

        for language in Language::ALL {
            let fields = doc.texts(language);
            if fields.is_empty() {
                continue;
            }
            let name = fields.name.unwrap_or("");
            let description = fields.description.unwrap_or("");

            sqlx::query(
                r#"
                INSERT INTO artefacts_fts
                    (artefact_id, lang, name, description, keywords, name_folded, description_folded)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&doc.id)
            .bind(language.tag())
            .bind(name)
            .bind(description)
            .bind(fields.keywords.join(" "))
            .bind(fold_text(name))
            .bind(fold_text(description))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Connect to the configured catalog and wrap it in a service.
///
/// The schema must already exist (`artefacts init`).
pub async fn open_catalog(config: &Config) -> Result<DataStoreService<SqliteStore>> {
    let pool = db::connect(config).await?;
    Ok(DataStoreService::new(
        SqliteStore::new(pool),
        ServiceSettings::from(config),
    ))
}

fn type_clause(filter: ArtefactFilter) -> &'static str {
    match filter.artefact_type() {
        Some(_) => " AND a.artefact_type = ?",
        None => "",
    }
}

fn decode_rows(rows: &[SqliteRow]) -> Result<Vec<ArtefactDocument>> {
    rows.iter()
        .map(|row| {
            let id: String = row.get("id");
            let json: String = row.get("document_json");
            serde_json::from_str(&json)
                .with_context(|| format!("Corrupt stored document for artefact {}", id))
        })
        .collect()
}

#[async_trait]
impl ArtefactStore for SqliteStore {
    async fn upsert_all(&self, docs: &[ArtefactDocument]) -> Result<()> {
        for doc in docs {
            self.upsert_one(doc)
                .await
                .with_context(|| format!("Failed to store artefact {}", doc.directory_path))?;
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ArtefactDocument>> {
        let row = sqlx::query("SELECT id, document_json FROM artefacts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(decode_rows(&[row])?.pop()),
            None => Ok(None),
        }
    }

    async fn list(&self, page: Page, filter: ArtefactFilter) -> Result<Vec<ArtefactDocument>> {
        let sql = format!(
            "SELECT a.id, a.document_json FROM artefacts a WHERE 1 = 1{} \
             ORDER BY a.sort_name, a.id LIMIT ? OFFSET ?",
            type_clause(filter)
        );
        let mut query = sqlx::query(&sql);
        if let Some(t) = filter.artefact_type() {
            query = query.bind(t.as_str());
        }
        let rows = query
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        decode_rows(&rows)
    }

    async fn scored_search(
        &self,
        query: &str,
        language: Language,
        page: Page,
        filter: ArtefactFilter,
    ) -> Result<Vec<ArtefactDocument>> {
        let Some(match_expr) = fts_query(query) else {
            return Ok(Vec::new());
        };

        let sql = format!(
            r#"
            SELECT a.id, a.document_json, bm25(artefacts_fts, {weights}) AS score
            FROM artefacts_fts
            JOIN artefacts a ON a.id = artefacts_fts.artefact_id
            WHERE artefacts_fts MATCH ? AND artefacts_fts.lang = ?{type_clause}
            ORDER BY score, a.id
            LIMIT ? OFFSET ?
            "#,
            weights = BM25_WEIGHTS,
            type_clause = type_clause(filter),
        );
        let mut q = sqlx::query(&sql).bind(match_expr).bind(language.tag());
        if let Some(t) = filter.artefact_type() {
            q = q.bind(t.as_str());
        }
        let rows = q
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        decode_rows(&rows)
    }

    async fn prefix_search(
        &self,
        query: &str,
        page: Page,
        filter: ArtefactFilter,
    ) -> Result<Vec<ArtefactDocument>> {
        let pattern = like_prefix_pattern(query);
        let sql = format!(
            r#"
            SELECT a.id, a.document_json
            FROM artefacts a
            WHERE a.id IN (
                SELECT artefact_id FROM artefacts_fts
                WHERE name_folded LIKE ? ESCAPE '\' OR description_folded LIKE ? ESCAPE '\'
            ){}
            ORDER BY a.sort_name, a.id
            LIMIT ? OFFSET ?
            "#,
            type_clause(filter)
        );
        let mut q = sqlx::query(&sql).bind(&pattern).bind(&pattern);
        if let Some(t) = filter.artefact_type() {
            q = q.bind(t.as_str());
        }
        let rows = q
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        decode_rows(&rows)
    }

    async fn count(&self, filter: ArtefactFilter) -> Result<i64> {
        let count: i64 = match filter.artefact_type() {
            Some(t) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM artefacts WHERE artefact_type = ?")
                    .bind(t.as_str())
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM artefacts")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count)
    }

    async fn find_all_ids(&self) -> Result<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM artefacts ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut deleted = 0u64;
        let mut tx = self.pool.begin().await?;

        for batch in ids.chunks(DELETE_BATCH) {
            let placeholders = vec!["?"; batch.len()].join(", ");

            let sql = format!(
                "DELETE FROM artefacts_fts WHERE artefact_id IN ({})",
                placeholders
            );
            let mut q = sqlx::query(&sql);
            for id in batch {
                q = q.bind(id);
            }
            q.execute(&mut *tx).await?;

            let sql = format!("DELETE FROM artefacts WHERE id IN ({})", placeholders);
            let mut q = sqlx::query(&sql);
            for id in batch {
                q = q.bind(id);
            }
            deleted += q.execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(deleted)
    }
}
