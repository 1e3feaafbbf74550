//! Storage abstraction for the artefact catalog.
//!
//! The [`ArtefactStore`] trait is the persistence boundary used by the
//! indexing service and the search algorithm, enabling pluggable backends
//! (SQLite for the CLI, in-memory for tests).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ArtefactDocument, ArtefactFilter, Language};

/// A window into an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Clamp `limit` to `[1, max_limit]` and `offset` to `>= 0`.
    pub fn new(limit: i64, offset: i64, max_limit: i64) -> Self {
        Self {
            limit: limit.clamp(1, max_limit.max(1)),
            offset: offset.max(0),
        }
    }
}

/// Abstract storage backend for the catalog.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_all`](ArtefactStore::upsert_all) | Replace documents by id, creating missing ones |
/// | [`find_by_id`](ArtefactStore::find_by_id) | Point lookup |
/// | [`list`](ArtefactStore::list) | Page of documents ordered by folded display name, then id |
/// | [`scored_search`](ArtefactStore::scored_search) | Relevance-ranked full-text match in one language |
/// | [`prefix_search`](ArtefactStore::prefix_search) | Name/description prefix match in any language |
/// | [`count`](ArtefactStore::count) | Number of documents matching a filter |
/// | [`find_all_ids`](ArtefactStore::find_all_ids) | Every id, for reconciliation |
/// | [`delete_by_ids`](ArtefactStore::delete_by_ids) | Bulk delete |
///
/// The two search stages are combined by [`crate::search::search`].
#[async_trait]
pub trait ArtefactStore: Send + Sync {
    /// Insert or fully replace each document. Each document is written
    /// atomically; an empty slice is a no-op.
    async fn upsert_all(&self, docs: &[ArtefactDocument]) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<ArtefactDocument>>;

    async fn list(&self, page: Page, filter: ArtefactFilter) -> Result<Vec<ArtefactDocument>>;

    /// `query` is already normalized (trimmed, lowercased). Results are
    /// ordered by relevance descending, then id.
    async fn scored_search(
        &self,
        query: &str,
        language: Language,
        page: Page,
        filter: ArtefactFilter,
    ) -> Result<Vec<ArtefactDocument>>;

    /// `query` is already normalized. Results are ordered like [`list`](ArtefactStore::list).
    async fn prefix_search(
        &self,
        query: &str,
        page: Page,
        filter: ArtefactFilter,
    ) -> Result<Vec<ArtefactDocument>>;

    async fn count(&self, filter: ArtefactFilter) -> Result<i64>;

    async fn find_all_ids(&self) -> Result<Vec<String>>;

    /// Returns the number of documents removed.
    async fn delete_by_ids(&self, ids: &[String]) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamps() {
        assert_eq!(Page::new(0, -5, 100), Page { limit: 1, offset: 0 });
        assert_eq!(Page::new(500, 10, 100), Page { limit: 100, offset: 10 });
        assert_eq!(Page::new(20, 0, 100), Page { limit: 20, offset: 0 });
    }
}
