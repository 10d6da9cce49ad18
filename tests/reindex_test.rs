//! Full rebuilds against in-memory and failing sources

mod common;

use asset_search::enrichment::EnrichmentPipeline;
use asset_search::indexing::*;
use asset_search::models::SearchableAsset;
use asset_search::search::*;
use async_trait::async_trait;
use common::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Source that can be told to fail batch loads
struct FlakySource {
    inner: InMemoryAssetSource,
    fail_loads: AtomicBool,
    loads: AtomicUsize,
}

impl FlakySource {
    fn new(assets: Vec<SearchableAsset>) -> Self {
        Self {
            inner: InMemoryAssetSource::from_assets(assets),
            fail_loads: AtomicBool::new(false),
            loads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AssetSource for FlakySource {
    async fn fetch_ids(&self, offset: usize, limit: usize) -> Result<Vec<String>, SourceError> {
        self.inner.fetch_ids(offset, limit).await
    }

    async fn load_assets(&self, ids: &[String]) -> Result<Vec<SearchableAsset>, SourceError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable("database connection reset".to_string()));
        }
        self.inner.load_assets(ids).await
    }
}

fn numbered_assets(count: usize) -> Vec<SearchableAsset> {
    (0..count)
        .map(|i| asset(&format!("n-{:04}", i), &format!("Workstation {}", i), "Dell", "Desktop", "ACTIVE", "Pool machine"))
        .collect()
}

fn setup(source: Arc<dyn AssetSource>) -> (Arc<IndexManager>, SearchService) {
    let config = SearchConfig::default();
    let store = Arc::new(IndexManager::in_memory(&config).unwrap());
    let service = SearchService::new(
        Arc::clone(&store) as Arc<dyn IndexStore>,
        source,
        EnrichmentPipeline::disabled(),
        config,
    );
    (store, service)
}

#[tokio::test]
async fn test_reindex_loads_every_batch() {
    let source = Arc::new(FlakySource::new(numbered_assets(320)));
    let (store, service) = setup(Arc::clone(&source) as Arc<dyn AssetSource>);

    let report = service.reindex_all(&ReindexConfig::full_rebuild()).await.unwrap();

    assert_eq!(report.documents_indexed, 320);
    // 320 ids in batches of 50
    assert_eq!(report.batches, 7);
    assert_eq!(source.loads.load(Ordering::SeqCst), 7);
    assert_eq!(store.stats().await.unwrap().total_documents, 320);
}

#[tokio::test]
async fn test_on_demand_preset() {
    let source = Arc::new(FlakySource::new(numbered_assets(60)));
    let (_store, service) = setup(source);

    let report = service.reindex_all(&ReindexConfig::on_demand()).await.unwrap();

    assert_eq!(report.documents_indexed, 60);
    assert_eq!(report.batches, 3);
}

#[tokio::test]
async fn test_reindex_replaces_stale_documents() {
    let source = Arc::new(InMemoryAssetSource::from_assets(fixture_assets()));
    let (store, service) = setup(Arc::clone(&source) as Arc<dyn AssetSource>);
    service.reindex_all(&ReindexConfig::default()).await.unwrap();

    // Indexed directly, never present in the source
    service
        .index_asset(&asset("x-1", "Cisco Switch", "Cisco", "Network", "ACTIVE", "Rack switch"))
        .await
        .unwrap();
    source.upsert(asset("a-5", "Juniper Router", "Juniper", "Network", "RETIRED", "Edge router"));
    service.reindex_all(&ReindexConfig::default()).await.unwrap();

    assert_eq!(store.stats().await.unwrap().total_documents, 5);
    assert!(service.fuzzy_name_search("Cisco Switch", Some(0), None).await.unwrap().is_empty());
    let routers = service.fuzzy_name_search("Juniper Router", Some(0), None).await.unwrap();
    assert_eq!(routers[0].id, "a-5");
}

#[tokio::test]
async fn test_failed_reindex_keeps_previous_index() {
    let source = Arc::new(FlakySource::new(fixture_assets()));
    let (store, service) = setup(Arc::clone(&source) as Arc<dyn AssetSource>);
    service.reindex_all(&ReindexConfig::default()).await.unwrap();

    source.fail_loads.store(true, Ordering::SeqCst);
    let result = service.reindex_all(&ReindexConfig::default()).await;

    assert!(matches!(
        result,
        Err(SearchError::Reindex(ReindexError::Source(SourceError::Unavailable(_))))
    ));
    assert_eq!(store.stats().await.unwrap().total_documents, 5);

    // The store accepts a new rebuild after the failed one
    source.fail_loads.store(false, Ordering::SeqCst);
    let report = service.reindex_all(&ReindexConfig::default()).await.unwrap();
    assert_eq!(report.documents_indexed, 5);
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_any_work() {
    let source = Arc::new(FlakySource::new(fixture_assets()));
    let (_store, service) = setup(Arc::clone(&source) as Arc<dyn AssetSource>);

    let config = ReindexConfig {
        worker_count: 0,
        ..ReindexConfig::default()
    };
    let result = service.reindex_all(&config).await;

    assert!(matches!(result, Err(SearchError::Reindex(ReindexError::InvalidConfig(_)))));
    assert_eq!(source.loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_source_empties_the_index() {
    let (store, service) = setup(Arc::new(InMemoryAssetSource::new()));
    service
        .index_asset(&asset("x-1", "Orphan Scanner", "Epson", "Scanner", "ACTIVE", "Not in the source"))
        .await
        .unwrap();

    let report = service.reindex_all(&ReindexConfig::default()).await.unwrap();

    assert_eq!(report.documents_indexed, 0);
    assert_eq!(report.batches, 0);
    assert_eq!(store.stats().await.unwrap().total_documents, 0);
}
