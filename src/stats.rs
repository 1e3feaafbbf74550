//! Catalog statistics.
//!
//! A quick summary of what's indexed: artefact counts per type, how many
//! carry each language, and when the catalog last changed. Used by
//! `artefacts stats` to confirm an index pass did what was expected.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;
use crate::models::Language;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM artefacts")
        .fetch_one(&pool)
        .await?;

    let type_rows = sqlx::query(
        r#"
        SELECT COALESCE(artefact_type, '-') AS kind, COUNT(*) AS n
        FROM artefacts
        GROUP BY kind
        ORDER BY n DESC, kind
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let lang_rows = sqlx::query(
        "SELECT lang, COUNT(DISTINCT artefact_id) AS n FROM artefacts_fts GROUP BY lang",
    )
    .fetch_all(&pool)
    .await?;

    let last_update: Option<i64> = sqlx::query_scalar("SELECT MAX(updated_at) FROM artefacts")
        .fetch_one(&pool)
        .await?;

    pool.close().await;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Artefact catalog stats");
    println!("======================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!("  Root:        {}", config.datastore.root.trim());
    println!();
    println!("  Artefacts:   {}", total);
    println!(
        "  Last change: {}",
        match last_update {
            Some(ts) => format_ts_relative(ts),
            None => "never".to_string(),
        }
    );

    if !type_rows.is_empty() {
        println!();
        println!("  By type:");
        for row in &type_rows {
            let kind: String = row.get("kind");
            let n: i64 = row.get("n");
            println!("    {:<12} {:>6}", kind, n);
        }
    }

    println!();
    println!("  By language:");
    for language in Language::ALL {
        let n = lang_rows
            .iter()
            .find(|row| row.get::<String, _>("lang") == language.tag())
            .map(|row| row.get::<i64, _>("n"))
            .unwrap_or(0);
        println!("    {:<12} {:>6}", language.tag(), n);
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_format_ts_relative() {
        let now = chrono::Utc::now().timestamp();
        assert_eq!(format_ts_relative(now), "just now");
        assert_eq!(format_ts_relative(now - 7200), "2 hours ago");
        assert_eq!(format_ts_relative(now - 86400), "1 day ago");
    }
}
