//! Read commands: `list`, `search`, `get`, `count` and `root`.
//!
//! Human-readable output by default; `--json` prints the public
//! [`Artefact`] shape for scripts.

use anyhow::Result;

use crate::config::Config;
use crate::models::{Artefact, ArtefactFilter, Language};
use crate::service::normalize_root;
use crate::sqlite_store::open_catalog;

/// Shared paging and output options.
#[derive(Debug, Clone, Copy)]
pub struct ListOptions {
    pub limit: Option<i64>,
    pub offset: i64,
    pub filter: ArtefactFilter,
    pub json: bool,
}

pub async fn run_list(config: &Config, opts: ListOptions) -> Result<()> {
    let service = open_catalog(config).await?;
    let limit = opts.limit.unwrap_or(config.search.default_limit);
    let artefacts = service.list(limit, opts.offset, opts.filter).await;
    service.store().close().await;

    print_artefacts(&artefacts?, opts.offset, opts.json)
}

pub async fn run_search(
    config: &Config,
    query: &str,
    language: Language,
    opts: ListOptions,
) -> Result<()> {
    let service = open_catalog(config).await?;
    let limit = opts.limit.unwrap_or(config.search.default_limit);
    let artefacts = service
        .search(query, language, limit, opts.offset, opts.filter)
        .await;
    service.store().close().await;

    print_artefacts(&artefacts?, opts.offset, opts.json)
}

pub async fn run_get(config: &Config, id: &str, json: bool) -> Result<()> {
    let service = open_catalog(config).await?;
    let artefact = service.find_by_id(id).await;
    service.store().close().await;

    let artefact = match artefact? {
        Some(a) => a,
        None => {
            eprintln!("Error: artefact not found: {}", id);
            std::process::exit(1);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&artefact)?);
        return Ok(());
    }

    println!("--- Artefact ---");
    println!("id:           {}", artefact.id);
    println!(
        "type:         {}",
        artefact.artefact_type.map(|t| t.as_str()).unwrap_or("-")
    );
    for name in &artefact.name {
        println!("name ({}):    {}", name.language, name.text);
    }
    for description in &artefact.description {
        println!("description ({}): {}", description.language, description.text);
    }
    for keywords in &artefact.keywords {
        println!("keywords ({}): {}", keywords.language, keywords.text.join(", "));
    }
    println!("provider:     {}", artefact.provider);
    println!("link:         {}", artefact.link);
    println!("attributions: {}", artefact.attributions.join("; "));
    println!("license:      {}", artefact.license);
    if let Some(weight) = artefact.weight {
        println!("weight:       {}", weight);
    }
    println!();
    println!("--- Files ({}) ---", artefact.files.len());
    for file in &artefact.files {
        println!("{}", file);
    }
    if !artefact.previews.is_empty() {
        println!();
        println!("--- Previews ({}) ---", artefact.previews.len());
        for preview in &artefact.previews {
            println!("{}", preview);
        }
    }

    Ok(())
}

pub async fn run_count(config: &Config, filter: ArtefactFilter) -> Result<()> {
    let service = open_catalog(config).await?;
    let count = service.count_artefacts(filter).await;
    service.store().close().await;

    println!("{}", count?);
    Ok(())
}

/// Print the normalized data-store root. Does not open the database.
pub fn run_root(config: &Config) -> Result<()> {
    println!("{}", normalize_root(&config.datastore.root)?.display());
    Ok(())
}

fn print_artefacts(artefacts: &[Artefact], offset: i64, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(artefacts)?);
        return Ok(());
    }

    if artefacts.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, artefact) in artefacts.iter().enumerate() {
        let name = artefact
            .name
            .iter()
            .find(|n| n.language == Language::English)
            .or_else(|| artefact.name.first())
            .map(|n| n.text.as_str())
            .unwrap_or("(unnamed)");
        let kind = artefact.artefact_type.map(|t| t.as_str()).unwrap_or("-");

        println!("{}. {} [{}]", offset + i as i64 + 1, name, kind);
        println!("    provider: {}", artefact.provider);
        println!("    files: {}", artefact.files.join(", "));
        println!("    id: {}", artefact.id);
        println!();
    }

    Ok(())
}
