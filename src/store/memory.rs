//! In-memory [`ArtefactStore`] implementation for testing.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`. Scored search counts how
//! many query words appear as whole words in the localized fields, which
//! mirrors the word-level matching of the SQLite text index.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{fold_text, ArtefactDocument, ArtefactFilter, Language};
use crate::search::tokenize;

use super::{ArtefactStore, Page};

/// In-memory catalog for tests.
pub struct InMemoryStore {
    docs: RwLock<HashMap<String, ArtefactDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, ArtefactDocument>>> {
        self.docs.read().map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, ArtefactDocument>>> {
        self.docs.write().map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    /// Filtered documents ordered by folded display name, then id.
    fn sorted(&self, filter: ArtefactFilter) -> Result<Vec<ArtefactDocument>> {
        let docs = self.read()?;
        let mut matching: Vec<ArtefactDocument> = docs
            .values()
            .filter(|d| filter.matches(d.artefact_type))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.sort_name().cmp(&b.sort_name()).then(a.id.cmp(&b.id)));
        Ok(matching)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn paginate(docs: Vec<ArtefactDocument>, page: Page) -> Vec<ArtefactDocument> {
    docs.into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect()
}

fn relevance(doc: &ArtefactDocument, terms: &HashSet<String>, language: Language) -> usize {
    let fields = doc.texts(language);
    let words: HashSet<String> = fields
        .name
        .into_iter()
        .chain(fields.description)
        .chain(fields.keywords)
        .flat_map(tokenize)
        .collect();
    terms.iter().filter(|t| words.contains(*t)).count()
}

fn starts_with_prefix(doc: &ArtefactDocument, prefix: &str) -> bool {
    Language::ALL.into_iter().any(|language| {
        let fields = doc.texts(language);
        fields
            .name
            .into_iter()
            .chain(fields.description)
            .any(|text| fold_text(text).starts_with(prefix))
    })
}

#[async_trait]
impl ArtefactStore for InMemoryStore {
    async fn upsert_all(&self, docs: &[ArtefactDocument]) -> Result<()> {
        let mut stored = self.write()?;
        for doc in docs {
            stored.insert(doc.id.clone(), doc.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ArtefactDocument>> {
        Ok(self.read()?.get(id).cloned())
    }

    async fn list(&self, page: Page, filter: ArtefactFilter) -> Result<Vec<ArtefactDocument>> {
        Ok(paginate(self.sorted(filter)?, page))
    }

    async fn scored_search(
        &self,
        query: &str,
        language: Language,
        page: Page,
        filter: ArtefactFilter,
    ) -> Result<Vec<ArtefactDocument>> {
        let terms: HashSet<String> = tokenize(query).into_iter().collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let docs = self.read()?;
        let mut scored: Vec<(usize, &ArtefactDocument)> = docs
            .values()
            .filter(|d| filter.matches(d.artefact_type))
            .map(|d| (relevance(d, &terms, language), d))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.id.cmp(&b.1.id)));

        let ranked = scored.into_iter().map(|(_, d)| d.clone()).collect();
        Ok(paginate(ranked, page))
    }

    async fn prefix_search(
        &self,
        query: &str,
        page: Page,
        filter: ArtefactFilter,
    ) -> Result<Vec<ArtefactDocument>> {
        let matching = self
            .sorted(filter)?
            .into_iter()
            .filter(|d| starts_with_prefix(d, query))
            .collect();
        Ok(paginate(matching, page))
    }

    async fn count(&self, filter: ArtefactFilter) -> Result<i64> {
        let docs = self.read()?;
        Ok(docs
            .values()
            .filter(|d| filter.matches(d.artefact_type))
            .count() as i64)
    }

    async fn find_all_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.read()?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<u64> {
        let mut stored = self.write()?;
        Ok(ids.iter().filter(|id| stored.remove(*id).is_some()).count() as u64)
    }
}
