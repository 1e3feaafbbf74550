//! Data-store indexing service.
//!
//! [`DataStoreService`] keeps the catalog consistent with the data-store
//! directory and exposes the read API used by callers.
//!
//! # Index pass
//!
//! ```text
//! root ──▶ scanner::scan ──▶ to_document (per manifest) ──▶ upsert_all
//!                                                              │
//!                     find_all_ids − indexed ids ──▶ delete_by_ids
//! ```
//!
//! Broken manifests and artefacts that cannot be mapped are logged and
//! left out; they never abort the pass. Upsert and delete are not
//! transactional together: if the delete phase fails, stale rows remain
//! until the next successful pass.
//!
//! Passes are expected to be single-flight (one scheduled job); two
//! concurrent passes over the same store may race on the delete phase.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::Config;
use crate::identity::{artefact_id, normalize_lexically, rebase_reference, relative_to_root};
use crate::manifest::{Manifest, ManifestText, ManifestTextList};
use crate::models::{
    Artefact, ArtefactDocument, ArtefactFilter, Language, LocalizedText, LocalizedTextList,
};
use crate::scanner::{self, ScanOptions};
use crate::search::{self, SearchRequest};
use crate::store::{ArtefactStore, Page};

/// Counters for one index pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Manifest files found under the root.
    pub scanned: usize,
    /// Documents written to the store.
    pub indexed: usize,
    /// Manifests or artefacts left out of the catalog.
    pub failed: usize,
    /// Stale documents removed.
    pub deleted: u64,
}

/// Settings the service needs from the application config.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Data-store root as configured, before normalization.
    pub root: String,
    pub scan: ScanOptions,
    pub max_limit: i64,
}

impl From<&Config> for ServiceSettings {
    fn from(config: &Config) -> Self {
        Self {
            root: config.datastore.root.clone(),
            scan: ScanOptions::from(&config.datastore),
            max_limit: config.search.max_limit,
        }
    }
}

pub struct DataStoreService<S: ArtefactStore> {
    store: S,
    settings: ServiceSettings,
}

impl<S: ArtefactStore> DataStoreService<S> {
    pub fn new(store: S, settings: ServiceSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The configured root with surrounding whitespace and trailing
    /// separators removed, made absolute against the working directory.
    pub fn get_root(&self) -> Result<PathBuf> {
        normalize_root(&self.settings.root)
    }

    /// Reconcile the catalog with the data-store directory.
    pub async fn index(&self) -> Result<IndexReport> {
        let root = self.get_root()?;
        if !root.is_dir() {
            bail!("Data-store root is not a directory: {}", root.display());
        }

        info!(root = %root.display(), "indexing data store");
        let outcome = scanner::scan(&root, &self.settings.scan).await?;

        let mut report = IndexReport {
            scanned: outcome.found,
            failed: outcome.failed(),
            ..IndexReport::default()
        };

        let mut documents: Vec<ArtefactDocument> = Vec::with_capacity(outcome.manifests.len());
        let mut seen: HashSet<String> = HashSet::new();
        for manifest in &outcome.manifests {
            match to_document(&root, manifest) {
                Ok(doc) => {
                    if seen.insert(doc.id.clone()) {
                        documents.push(doc);
                    } else {
                        warn!(
                            path = %manifest.source_path.display(),
                            directory = %doc.directory_path,
                            "directory already has a manifest, skipped"
                        );
                        report.failed += 1;
                    }
                }
                Err(e) => {
                    warn!(path = %manifest.source_path.display(), error = %e, "artefact skipped");
                    report.failed += 1;
                }
            }
        }

        report.indexed = self.persist(&documents).await;
        report.failed += documents.len() - report.indexed;

        let stale: Vec<String> = self
            .store
            .find_all_ids()
            .await
            .context("Failed to list catalog ids")?
            .into_iter()
            .filter(|id| !seen.contains(id))
            .collect();
        report.deleted = self
            .store
            .delete_by_ids(&stale)
            .await
            .context("Failed to delete stale artefacts")?;

        info!(
            scanned = report.scanned,
            indexed = report.indexed,
            failed = report.failed,
            deleted = report.deleted,
            "index complete"
        );
        Ok(report)
    }

    /// Write documents in bulk; if that fails, retry one by one so a
    /// single bad document does not keep the others out. Returns how many
    /// were written.
    async fn persist(&self, documents: &[ArtefactDocument]) -> usize {
        match self.store.upsert_all(documents).await {
            Ok(()) => return documents.len(),
            Err(e) => warn!(error = %e, "bulk upsert failed, retrying per artefact"),
        }

        let mut written = 0;
        for doc in documents {
            match self.store.upsert_all(std::slice::from_ref(doc)).await {
                Ok(()) => written += 1,
                Err(e) => warn!(directory = %doc.directory_path, error = %e, "artefact not stored"),
            }
        }
        written
    }

    pub async fn list(
        &self,
        limit: i64,
        offset: i64,
        filter: ArtefactFilter,
    ) -> Result<Vec<Artefact>> {
        let page = Page::new(limit, offset, self.settings.max_limit);
        let docs = self.store.list(page, filter).await?;
        Ok(docs.into_iter().map(Artefact::from).collect())
    }

    pub async fn search(
        &self,
        query: &str,
        language: Language,
        limit: i64,
        offset: i64,
        filter: ArtefactFilter,
    ) -> Result<Vec<Artefact>> {
        let req = SearchRequest {
            query,
            language,
            page: Page::new(limit, offset, self.settings.max_limit),
            filter,
        };
        let docs = search::search(&self.store, &req).await?;
        Ok(docs.into_iter().map(Artefact::from).collect())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Artefact>> {
        Ok(self.store.find_by_id(id).await?.map(Artefact::from))
    }

    pub async fn count_artefacts(&self, filter: ArtefactFilter) -> Result<i64> {
        self.store.count(filter).await
    }
}

/// Trim whitespace and trailing separators, then make absolute.
pub fn normalize_root(configured: &str) -> Result<PathBuf> {
    let trimmed = configured.trim();
    let without_slash = trimmed.trim_end_matches(['/', '\\']);
    // "/" trims to "" and must stay the filesystem root.
    let raw = if without_slash.is_empty() && !trimmed.is_empty() {
        &trimmed[..1]
    } else {
        without_slash
    };
    if raw.is_empty() {
        bail!("Data-store root is empty");
    }

    let absolute = std::path::absolute(raw)
        .with_context(|| format!("Cannot resolve data-store root: {}", raw))?;
    Ok(normalize_lexically(&absolute))
}

/// Map a validated manifest to its catalog document.
pub fn to_document(root: &Path, manifest: &Manifest) -> Result<ArtefactDocument> {
    let manifest_dir = manifest.directory();
    let directory_path = relative_to_root(root, manifest_dir)?;
    let artefact = &manifest.artefact;

    let rebase = |reference: &String| rebase_reference(root, manifest_dir, reference);

    Ok(ArtefactDocument {
        id: artefact_id(&directory_path),
        artefact_type: artefact.artefact_type,
        name: localize_texts(&artefact.name)?,
        description: localize_texts(&artefact.description)?,
        keywords: localize_lists(&artefact.keywords)?,
        license: rebase(&artefact.license)?,
        attributions: artefact.attributions.clone(),
        provider: artefact.provider.clone(),
        link: artefact.link.clone(),
        files: artefact.files.iter().map(rebase).collect::<Result<_>>()?,
        previews: artefact.previews.iter().map(rebase).collect::<Result<_>>()?,
        weight: artefact.weight,
        directory_path,
    })
}

fn language(tag: &str) -> Result<Language> {
    Language::from_tag(tag).with_context(|| format!("Unsupported language: '{}'", tag))
}

fn localize_texts(texts: &[ManifestText]) -> Result<Vec<LocalizedText>> {
    texts
        .iter()
        .map(|t| {
            Ok(LocalizedText {
                language: language(&t.language)?,
                text: t.text.clone(),
            })
        })
        .collect()
}

fn localize_lists(lists: &[ManifestTextList]) -> Result<Vec<LocalizedTextList>> {
    lists
        .iter()
        .map(|l| {
            Ok(LocalizedTextList {
                language: language(&l.language)?,
                text: l.text.clone(),
            })
        })
        .collect()
}
