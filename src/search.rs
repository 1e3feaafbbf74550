//! Two-stage catalog search.
//!
//! The algorithm operates entirely through the [`ArtefactStore`] trait:
//!
//! 1. Normalize the query (trim, lowercase). An empty query matches nothing.
//! 2. Scored stage: full-text match on the localized name, description and
//!    keywords of the requested language, ordered by relevance then id.
//! 3. Only if the scored stage returns no rows, prefix stage: documents whose
//!    name or description (any language) starts with the query, ordered by
//!    folded display name then id.
//!
//! The two stages are never merged. A partially typed word ("mounta") has
//! no full-text match but is still found by its prefix.

use anyhow::Result;
use tracing::debug;

use crate::models::{ArtefactDocument, ArtefactFilter, Language};
use crate::store::{ArtefactStore, Page};

/// Bundles all inputs for a single search invocation.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub language: Language,
    pub page: Page,
    pub filter: ArtefactFilter,
}

pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Run the scored stage and, if it is empty, the prefix fallback.
pub async fn search<S: ArtefactStore + ?Sized>(
    store: &S,
    req: &SearchRequest<'_>,
) -> Result<Vec<ArtefactDocument>> {
    let query = normalize_query(req.query);
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let scored = store
        .scored_search(&query, req.language, req.page, req.filter)
        .await?;
    if !scored.is_empty() {
        return Ok(scored);
    }

    debug!(query = %query, "no scored match, using prefix fallback");
    store.prefix_search(&query, req.page, req.filter).await
}

/// Split text into lowercase alphanumeric words.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Build an FTS5 expression that ORs every query word as a quoted string,
/// so user input cannot produce an FTS syntax error.
///
/// Returns `None` when the query contains no searchable word.
pub(crate) fn fts_query(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .filter(|t| t.chars().any(char::is_alphanumeric))
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

/// `LIKE` pattern matching values that start with `prefix`, escaped with `\`.
pub(crate) fn like_prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
