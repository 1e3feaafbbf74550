//! In-process tests of the indexing service on the SQLite backend.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use artefact_index::db;
use artefact_index::migrate;
use artefact_index::models::{ArtefactFilter, Language};
use artefact_index::scanner::ScanOptions;
use artefact_index::service::{DataStoreService, ServiceSettings};
use artefact_index::sqlite_store::SqliteStore;
use artefact_index::store::ArtefactStore;

fn write_artefact(root: &Path, dir: &str, kind: &str, en: &str, fr: &str) {
    let dir_path = root.join(dir);
    fs::create_dir_all(&dir_path).unwrap();
    fs::write(dir_path.join("LICENSE"), "license").unwrap();
    fs::write(dir_path.join("data.zip"), "payload").unwrap();
    let manifest = format!(
        r#"version: 0.1
artefact:
  name:
    - language: en
      text: "{en}"
    - language: fr
      text: "{fr}"
  type: {kind}
  license: LICENSE
  attributions: [Test]
  provider: Test
  link: https://example.org
  files: [data.zip]
"#
    );
    fs::write(dir_path.join("artefact.yaml"), manifest).unwrap();
}

async fn open_service(tmp: &TempDir, root: &Path) -> DataStoreService<SqliteStore> {
    let pool = db::connect_path(&tmp.path().join("db/catalog.sqlite"))
        .await
        .unwrap();
    migrate::apply(&pool).await.unwrap();
    DataStoreService::new(
        SqliteStore::new(pool),
        ServiceSettings {
            root: root.display().to_string(),
            scan: ScanOptions::default(),
            max_limit: 10,
        },
    )
}

fn fixture() -> (TempDir, std::path::PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("store");
    for i in 0..12 {
        let kind = if i % 3 == 0 { "base-map" } else { "data" };
        write_artefact(
            &root,
            &format!("layers/layer-{:02}", i),
            kind,
            &format!("Layer {:02}", i),
            &format!("Couche {:02}", i),
        );
    }
    (tmp, root)
}

#[tokio::test]
async fn test_paging_is_stable_and_clamped() {
    let (tmp, root) = fixture();
    let service = open_service(&tmp, &root).await;

    let report = service.index().await.unwrap();
    assert_eq!(report.scanned, 12);
    assert_eq!(report.indexed, 12);
    assert_eq!(report.failed, 0);

    // max_limit is 10: a request for 50 gets 10.
    let first = service.list(50, 0, ArtefactFilter::All).await.unwrap();
    assert_eq!(first.len(), 10);
    let rest = service.list(50, 10, ArtefactFilter::All).await.unwrap();
    assert_eq!(rest.len(), 2);

    let ids: HashSet<&str> = first.iter().chain(&rest).map(|a| a.id.as_str()).collect();
    assert_eq!(ids.len(), 12);

    let again = service.list(50, 0, ArtefactFilter::All).await.unwrap();
    assert_eq!(first, again);

    // A zero limit is raised to one.
    assert_eq!(service.list(0, 0, ArtefactFilter::All).await.unwrap().len(), 1);
    service.store().close().await;
}

#[tokio::test]
async fn test_filters_and_counts() {
    let (tmp, root) = fixture();
    let service = open_service(&tmp, &root).await;
    service.index().await.unwrap();

    assert_eq!(service.count_artefacts(ArtefactFilter::All).await.unwrap(), 12);
    assert_eq!(
        service.count_artefacts(ArtefactFilter::OnlyBaseMaps).await.unwrap(),
        4
    );
    assert_eq!(service.count_artefacts(ArtefactFilter::OnlyData).await.unwrap(), 8);

    let maps = service.list(10, 0, ArtefactFilter::OnlyBaseMaps).await.unwrap();
    assert_eq!(maps.len(), 4);
    service.store().close().await;
}

#[tokio::test]
async fn test_search_languages_and_fallback() {
    let (tmp, root) = fixture();
    let service = open_service(&tmp, &root).await;
    service.index().await.unwrap();

    let hits = service
        .search("couche 07", Language::French, 10, 0, ArtefactFilter::All)
        .await
        .unwrap();
    // Every French name contains "couche"; the one with "07" ranks first.
    assert_eq!(hits.len(), 10);
    assert!(hits[0].name.iter().any(|n| n.text == "Couche 07"));

    let none = service
        .search("couches", Language::English, 10, 0, ArtefactFilter::All)
        .await
        .unwrap();
    assert!(none.is_empty());

    // No English text matches, but the fallback looks at every language.
    let fallback = service
        .search("couche", Language::English, 10, 0, ArtefactFilter::All)
        .await
        .unwrap();
    assert_eq!(fallback.len(), 10);
    assert!(fallback[0].name.iter().any(|n| n.text == "Couche 00"));

    let prefix = service
        .search("lay", Language::English, 10, 0, ArtefactFilter::OnlyBaseMaps)
        .await
        .unwrap();
    assert_eq!(prefix.len(), 4);
    service.store().close().await;
}

#[tokio::test]
async fn test_reindex_after_removal_and_paths() {
    let (tmp, root) = fixture();
    let service = open_service(&tmp, &root).await;
    service.index().await.unwrap();

    fs::remove_dir_all(root.join("layers/layer-05")).unwrap();
    let report = service.index().await.unwrap();
    assert_eq!(report.deleted, 1);
    assert_eq!(service.store().find_all_ids().await.unwrap().len(), 11);

    let hits = service
        .search("layer 04", Language::English, 1, 0, ArtefactFilter::All)
        .await
        .unwrap();
    assert_eq!(hits[0].files, vec!["layers/layer-04/data.zip".to_string()]);
    assert_eq!(hits[0].license, "layers/layer-04/LICENSE");
    service.store().close().await;
}
