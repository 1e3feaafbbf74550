//! Export the catalog as JSON.
//!
//! Writes every indexed artefact in its public shape, in catalog order
//! (display name, then id). Useful for static site listings or for
//! diffing two catalogs.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::Row;
use std::path::Path;

use crate::config::Config;
use crate::db;
use crate::models::{Artefact, ArtefactDocument};

#[derive(Serialize)]
struct ExportData {
    root: String,
    count: usize,
    artefacts: Vec<Artefact>,
}

/// Export all artefacts as JSON.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let pool = db::connect(config).await?;

    let rows = sqlx::query("SELECT id, document_json FROM artefacts ORDER BY sort_name, id")
        .fetch_all(&pool)
        .await;
    pool.close().await;

    let artefacts = rows?
        .iter()
        .map(|row| {
            let id: String = row.get("id");
            let json: String = row.get("document_json");
            let doc: ArtefactDocument = serde_json::from_str(&json)
                .with_context(|| format!("Corrupt stored document for artefact {}", id))?;
            Ok(Artefact::from(doc))
        })
        .collect::<Result<Vec<_>>>()?;

    let count = artefacts.len();
    let data = ExportData {
        root: config.datastore.root.trim().to_string(),
        count,
        artefacts,
    };
    let json = serde_json::to_string_pretty(&data)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Exported {} artefacts to {}", count, path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}
