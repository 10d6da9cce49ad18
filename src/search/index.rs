//! Search index management

use crate::models::SearchableAsset;
use crate::search::config::SearchConfig;
use crate::search::document::{asset_from_doc, SearchDocument};
use crate::search::error::{IndexStoreError, IndexStoreResult};
use crate::search::predicate::PredicateNode;
use crate::search::query::QueryBuilder;
use crate::search::schema::{register_tokenizers, AssetField, AssetSchema, SCHEMA_VERSION};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{AllQuery, Query};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, info, warn};

/// Marker file recording which field mapping an on-disk index was built with
const SCHEMA_VERSION_FILE: &str = "asset_schema.version";

/// A scored document returned by the index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub asset: SearchableAsset,
    pub score: f32,
}

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Total number of documents in the index
    pub total_documents: u64,

    /// Number of segments
    pub num_segments: usize,

    /// Field mapping version
    pub schema_version: u32,
}

/// Full-text index holding searchable assets.
///
/// Single-document writes are visible to readers once the call returns.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Insert or replace one asset
    async fn index_asset(&self, asset: &SearchableAsset) -> IndexStoreResult<()>;

    /// Remove an asset by id; unknown ids are not an error
    async fn delete_asset(&self, id: &str) -> IndexStoreResult<()>;

    /// Top `limit` hits for a predicate, by descending score
    async fn query(&self, predicate: &PredicateNode, limit: usize) -> IndexStoreResult<Vec<IndexHit>>;

    /// Start replacing the whole index. Readers keep seeing the previous
    /// contents until the session commits; only one session runs at a time.
    async fn begin_rebuild(&self) -> IndexStoreResult<Box<dyn RebuildSession>>;

    async fn stats(&self) -> IndexStoreResult<IndexStats>;
}

/// An in-progress full index replacement
#[async_trait]
pub trait RebuildSession: Send {
    /// Stage a batch of assets; returns the number staged
    async fn add_batch(&mut self, assets: &[SearchableAsset]) -> IndexStoreResult<usize>;

    /// Publish the staged contents, replacing the previous index
    async fn commit(&mut self) -> IndexStoreResult<u64>;

    /// Discard staged contents and keep the previous index
    async fn abort(&mut self) -> IndexStoreResult<()>;
}

/// Manages the Tantivy search index
pub struct IndexManager {
    /// Resolved schema and field handles
    schema: Arc<AssetSchema>,

    /// Index writer (wrapped in RwLock for thread-safety)
    writer: Arc<RwLock<IndexWriter>>,

    /// Index reader, reloaded after every commit
    reader: IndexReader,

    /// Predicate translation
    queries: QueryBuilder,
}

impl IndexManager {
    /// Open the index at `config.index_path`, creating it if absent
    pub async fn new(config: SearchConfig) -> IndexStoreResult<Self> {
        // Create index directory if it doesn't exist
        std::fs::create_dir_all(&config.index_path).map_err(|e| {
            IndexStoreError::IndexInitFailed(format!("Failed to create index directory: {}", e))
        })?;

        let (index, schema) = if Self::index_exists(&config.index_path) {
            Self::check_schema_version(&config.index_path)?;
            let index = Index::open_in_dir(&config.index_path).map_err(|e| {
                IndexStoreError::IndexInitFailed(format!("Failed to open existing index: {}", e))
            })?;
            let schema = AssetSchema::from_schema(index.schema())?;
            (index, schema)
        } else {
            let schema = AssetSchema::build();
            let index = Index::create_in_dir(&config.index_path, schema.schema().clone()).map_err(|e| {
                IndexStoreError::IndexInitFailed(format!("Failed to create new index: {}", e))
            })?;
            std::fs::write(
                config.index_path.join(SCHEMA_VERSION_FILE),
                SCHEMA_VERSION.to_string(),
            )?;
            (index, schema)
        };

        info!(path = %config.index_path.display(), schema_version = SCHEMA_VERSION, "Opened asset index");
        Self::from_index(index, schema, &config)
    }

    /// Create a non-persistent index, used by tests and ephemeral deployments
    pub fn in_memory(config: &SearchConfig) -> IndexStoreResult<Self> {
        let schema = AssetSchema::build();
        let index = Index::create_in_ram(schema.schema().clone());
        Self::from_index(index, schema, config)
    }

    fn from_index(index: Index, schema: AssetSchema, config: &SearchConfig) -> IndexStoreResult<Self> {
        register_tokenizers(&index);

        // Create index writer
        let writer = index
            .writer(config.writer_heap_size)
            .map_err(|e| IndexStoreError::IndexInitFailed(format!("Failed to create writer: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| IndexStoreError::IndexInitFailed(format!("Failed to create reader: {}", e)))?;

        Ok(Self {
            queries: QueryBuilder::new(index, schema.clone()),
            schema: Arc::new(schema),
            writer: Arc::new(RwLock::new(writer)),
            reader,
        })
    }

    /// Check if an index exists at the given path
    fn index_exists(path: &Path) -> bool {
        path.join("meta.json").exists()
    }

    fn check_schema_version(path: &Path) -> IndexStoreResult<()> {
        let recorded = std::fs::read_to_string(path.join(SCHEMA_VERSION_FILE)).unwrap_or_default();
        match recorded.trim().parse::<u32>() {
            Ok(version) if version == SCHEMA_VERSION => Ok(()),
            Ok(version) => Err(IndexStoreError::SchemaMismatch(format!(
                "index at {} has schema version {}, expected {}",
                path.display(),
                version,
                SCHEMA_VERSION
            ))),
            Err(_) => Err(IndexStoreError::SchemaMismatch(format!(
                "index at {} has no readable schema version",
                path.display()
            ))),
        }
    }

    fn id_term(&self, id: &str) -> Term {
        Term::from_field_text(self.schema.field(AssetField::Id), id)
    }

    fn collect_hits(&self, query: &dyn Query, limit: usize) -> IndexStoreResult<Vec<IndexHit>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(query, &TopDocs::with_limit(limit))
            .map_err(|e| IndexStoreError::SearchFailed(e.to_string()))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            hits.push(IndexHit {
                asset: asset_from_doc(&doc, &self.schema)?,
                score,
            });
        }

        Ok(hits)
    }

    /// Sample of the index regardless of relevance
    pub fn match_all(&self, limit: usize) -> IndexStoreResult<Vec<IndexHit>> {
        self.collect_hits(&AllQuery, limit)
    }
}

#[async_trait]
impl IndexStore for IndexManager {
    async fn index_asset(&self, asset: &SearchableAsset) -> IndexStoreResult<()> {
        let tantivy_doc = asset.to_tantivy_doc(&self.schema)?;

        let mut writer = self.writer.write().await;

        // Delete existing document with same ID first
        writer.delete_term(self.id_term(&asset.document_id()));

        writer
            .add_document(tantivy_doc)
            .map_err(|e| IndexStoreError::IndexingFailed(format!("Failed to add document: {}", e)))?;

        writer
            .commit()
            .map_err(|e| IndexStoreError::IndexingFailed(format!("Failed to commit document: {}", e)))?;
        self.reader.reload()?;

        debug!(asset_id = %asset.id, "Indexed asset");
        Ok(())
    }

    async fn delete_asset(&self, id: &str) -> IndexStoreResult<()> {
        let mut writer = self.writer.write().await;
        writer.delete_term(self.id_term(id));
        writer
            .commit()
            .map_err(|e| IndexStoreError::IndexingFailed(format!("Failed to commit deletion: {}", e)))?;
        self.reader.reload()?;
        Ok(())
    }

    async fn query(&self, predicate: &PredicateNode, limit: usize) -> IndexStoreResult<Vec<IndexHit>> {
        let query = self.queries.build(predicate)?;
        self.collect_hits(query.as_ref(), limit)
    }

    async fn begin_rebuild(&self) -> IndexStoreResult<Box<dyn RebuildSession>> {
        let writer = Arc::clone(&self.writer).write_owned().await;
        writer
            .delete_all_documents()
            .map_err(|e| IndexStoreError::IndexingFailed(format!("Failed to clear index: {}", e)))?;

        Ok(Box::new(TantivyRebuildSession {
            writer,
            reader: self.reader.clone(),
            schema: Arc::clone(&self.schema),
            staged: 0,
            finished: false,
        }))
    }

    async fn stats(&self) -> IndexStoreResult<IndexStats> {
        let searcher = self.reader.searcher();
        Ok(IndexStats {
            total_documents: searcher.num_docs(),
            num_segments: searcher.segment_readers().len(),
            schema_version: SCHEMA_VERSION,
        })
    }
}

/// Rebuild holding the index writer for its whole lifetime. Dropping an
/// unfinished session rolls back.
struct TantivyRebuildSession {
    writer: OwnedRwLockWriteGuard<IndexWriter>,
    reader: IndexReader,
    schema: Arc<AssetSchema>,
    staged: u64,
    finished: bool,
}

impl TantivyRebuildSession {
    fn ensure_open(&self) -> IndexStoreResult<()> {
        if self.finished {
            Err(IndexStoreError::SessionFinished)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RebuildSession for TantivyRebuildSession {
    async fn add_batch(&mut self, assets: &[SearchableAsset]) -> IndexStoreResult<usize> {
        self.ensure_open()?;

        let id_field = self.schema.field(AssetField::Id);
        for asset in assets {
            let doc = asset.to_tantivy_doc(&self.schema)?;
            // Sources may hand out the same id twice; last one wins
            self.writer.delete_term(Term::from_field_text(id_field, &asset.id));
            self.writer.add_document(doc).map_err(|e| {
                IndexStoreError::IndexingFailed(format!("Failed to add asset {}: {}", asset.id, e))
            })?;
        }

        self.staged += assets.len() as u64;
        Ok(assets.len())
    }

    async fn commit(&mut self) -> IndexStoreResult<u64> {
        self.ensure_open()?;
        self.finished = true;

        self.writer
            .commit()
            .map_err(|e| IndexStoreError::IndexingFailed(format!("Failed to commit rebuild: {}", e)))?;
        self.reader.reload()?;

        Ok(self.staged)
    }

    async fn abort(&mut self) -> IndexStoreResult<()> {
        self.ensure_open()?;
        self.finished = true;
        self.writer.rollback()?;
        Ok(())
    }
}

impl Drop for TantivyRebuildSession {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.writer.rollback() {
                warn!(error = %e, "Failed to roll back abandoned rebuild");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::predicate::Leaf;
    use tempfile::TempDir;

    fn asset(id: &str, name: &str) -> SearchableAsset {
        SearchableAsset::new(id, name, "ACTIVE")
    }

    #[tokio::test]
    async fn test_index_creation() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig {
            index_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        let manager = IndexManager::new(config.clone()).await;
        assert!(manager.is_ok());
        drop(manager);

        // Reopening finds the version marker
        assert!(IndexManager::new(config).await.is_ok());
    }

    #[tokio::test]
    async fn test_version_mismatch_is_refused() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig {
            index_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        drop(IndexManager::new(config.clone()).await.unwrap());
        std::fs::write(temp_dir.path().join(SCHEMA_VERSION_FILE), "0").unwrap();

        let result = IndexManager::new(config).await;
        assert!(matches!(result, Err(IndexStoreError::SchemaMismatch(_))));
    }

    #[tokio::test]
    async fn test_index_and_delete() {
        let manager = IndexManager::in_memory(&SearchConfig::default()).unwrap();
        manager.index_asset(&asset("a-1", "Dell Laptop")).await.unwrap();
        manager.index_asset(&asset("a-1", "Dell Laptop Pro")).await.unwrap();

        let stats = manager.stats().await.unwrap();
        assert_eq!(stats.total_documents, 1);

        let hits = manager.query(&PredicateNode::MatchAll, 10).await.unwrap();
        assert_eq!(hits[0].asset.name, "Dell Laptop Pro");

        manager.delete_asset("a-1").await.unwrap();
        assert_eq!(manager.stats().await.unwrap().total_documents, 0);
    }

    #[tokio::test]
    async fn test_rebuild_is_invisible_until_commit() {
        let manager = IndexManager::in_memory(&SearchConfig::default()).unwrap();
        manager.index_asset(&asset("old", "Old Router")).await.unwrap();

        let mut session = manager.begin_rebuild().await.unwrap();
        session.add_batch(&[asset("n-1", "New Switch"), asset("n-2", "New Firewall")]).await.unwrap();

        let visible = manager.match_all(10).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].asset.id, "old");

        assert_eq!(session.commit().await.unwrap(), 2);
        let hits = manager
            .query(&Leaf::matching(AssetField::Name, "switch").into(), 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(manager.stats().await.unwrap().total_documents, 2);
        assert!(matches!(session.commit().await, Err(IndexStoreError::SessionFinished)));
    }

    #[tokio::test]
    async fn test_abandoned_rebuild_keeps_previous_contents() {
        let manager = IndexManager::in_memory(&SearchConfig::default()).unwrap();
        manager.index_asset(&asset("old", "Old Router")).await.unwrap();

        {
            let mut session = manager.begin_rebuild().await.unwrap();
            session.add_batch(&[asset("n-1", "New Switch")]).await.unwrap();
        }

        // Writer is usable again after the rollback
        manager.index_asset(&asset("extra", "Spare Monitor")).await.unwrap();

        let mut ids: Vec<String> = manager
            .match_all(10)
            .unwrap()
            .into_iter()
            .map(|hit| hit.asset.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["extra".to_string(), "old".to_string()]);
    }

    #[tokio::test]
    async fn test_zero_limit_returns_nothing() {
        let manager = IndexManager::in_memory(&SearchConfig::default()).unwrap();
        manager.index_asset(&asset("a-1", "Dell Laptop")).await.unwrap();
        assert!(manager.query(&PredicateNode::MatchAll, 0).await.unwrap().is_empty());
    }
}
