//! Data-store scanner.
//!
//! Walks the data-store root for `artefact.yml` / `artefact.yaml` files
//! (case-insensitive) and reads each one with a bounded number of
//! concurrent readers. A broken manifest is logged and dropped; it never
//! fails the scan.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::DatastoreConfig;
use crate::manifest::{read_manifest, Manifest, ManifestError};

const MANIFEST_FILE_NAMES: [&str; 2] = ["artefact.yml", "artefact.yaml"];

/// How the data-store tree is walked.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Extra glob patterns (relative to the root) to skip.
    pub exclude_globs: Vec<String>,
    pub follow_symlinks: bool,
    /// Maximum number of manifests read at the same time.
    pub concurrency: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude_globs: Vec::new(),
            follow_symlinks: false,
            concurrency: 16,
        }
    }
}

impl From<&DatastoreConfig> for ScanOptions {
    fn from(config: &DatastoreConfig) -> Self {
        Self {
            exclude_globs: config.exclude_globs.clone(),
            follow_symlinks: config.follow_symlinks,
            concurrency: config.scan_concurrency,
        }
    }
}

/// Result of one scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Number of manifest files found on disk.
    pub found: usize,
    /// Manifests that parsed and validated, sorted by source path.
    pub manifests: Vec<Manifest>,
}

impl ScanOutcome {
    pub fn failed(&self) -> usize {
        self.found - self.manifests.len()
    }
}

pub fn is_manifest_file_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    MANIFEST_FILE_NAMES.contains(&lower.as_str())
}

/// List manifest files under `root`, in lexicographic path order.
pub fn find_manifest_paths(root: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("Data-store root is not a directory: {}", root.display());
    }

    let mut excludes = vec![
        "**/.git/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    excludes.extend(options.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&excludes)?;

    let mut paths = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(options.follow_symlinks)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable data-store entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if !is_manifest_file_name(&entry.file_name().to_string_lossy()) {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if exclude_set.is_match(relative) {
            debug!(path = %relative.display(), "manifest excluded");
            continue;
        }
        paths.push(path.to_path_buf());
    }

    paths.sort();
    Ok(paths)
}

/// Find and read every manifest under `root`.
///
/// Fails only when the root itself cannot be walked.
pub async fn scan(root: &Path, options: &ScanOptions) -> Result<ScanOutcome> {
    let paths = find_manifest_paths(root, options)?;
    let found = paths.len();

    let results = read_all(paths, options.concurrency).await;
    let manifests = keep_valid(results);

    Ok(ScanOutcome { found, manifests })
}

async fn read_all(
    paths: Vec<PathBuf>,
    concurrency: usize,
) -> Vec<(PathBuf, Result<Manifest, ManifestError>)> {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut readers = JoinSet::new();

    for path in paths {
        let permits = Arc::clone(&permits);
        readers.spawn(async move {
            // The semaphore is never closed.
            let _permit = permits.acquire_owned().await;
            let result = read_manifest(&path).await;
            (path, result)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = readers.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(e) => warn!(error = %e, "manifest reader task failed"),
        }
    }
    results
}

/// Log every failure and keep the successes, ordered by source path.
fn keep_valid(results: Vec<(PathBuf, Result<Manifest, ManifestError>)>) -> Vec<Manifest> {
    let mut manifests: Vec<Manifest> = results
        .into_iter()
        .filter_map(|(path, result)| match result {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid manifest skipped");
                None
            }
        })
        .collect();
    manifests.sort_by(|a, b| a.source_path.cmp(&b.source_path));
    manifests
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
