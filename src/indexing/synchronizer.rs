//! Full index rebuilds from the system of record

use crate::indexing::source::{AssetSource, SourceError};
use crate::models::SearchableAsset;
use crate::search::{IndexStore, IndexStoreError, RebuildSession};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Errors that abort a rebuild
#[derive(Debug, thiserror::Error)]
pub enum ReindexError {
    #[error("Invalid reindex configuration: {0}")]
    InvalidConfig(String),

    #[error("Asset source failed: {0}")]
    Source(#[from] SourceError),

    #[error("Index failed: {0}")]
    Index(#[from] IndexStoreError),

    #[error("Reindex interrupted: {0}")]
    Interrupted(String),
}

/// Concurrency and batching for a rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReindexConfig {
    /// Concurrent batch loads
    #[serde(alias = "workerCount")]
    pub worker_count: usize,

    /// Assets per loaded batch
    #[serde(alias = "batchSize")]
    pub batch_size: usize,

    /// Ids per listing page
    #[serde(alias = "idFetchSize")]
    pub id_fetch_size: usize,
}

impl ReindexConfig {
    /// Scheduled or operator-triggered rebuild
    pub const fn full_rebuild() -> Self {
        Self {
            worker_count: 4,
            batch_size: 50,
            id_fetch_size: 150,
        }
    }

    /// Rebuild run ahead of a compound search
    pub const fn on_demand() -> Self {
        Self {
            worker_count: 12,
            batch_size: 25,
            id_fetch_size: 150,
        }
    }

    pub fn validate(&self) -> Result<(), ReindexError> {
        for (name, value) in [
            ("worker_count", self.worker_count),
            ("batch_size", self.batch_size),
            ("id_fetch_size", self.id_fetch_size),
        ] {
            if value == 0 {
                return Err(ReindexError::InvalidConfig(format!("{} must be greater than zero", name)));
            }
        }
        Ok(())
    }
}

impl Default for ReindexConfig {
    fn default() -> Self {
        Self::full_rebuild()
    }
}

/// Outcome of a completed rebuild
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReindexReport {
    pub documents_indexed: u64,
    pub batches: usize,
    #[serde(rename = "durationMs", with = "duration_millis")]
    pub duration: Duration,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Rebuilds an [`IndexStore`] from an [`AssetSource`]
pub struct IndexSynchronizer {
    store: Arc<dyn IndexStore>,
    source: Arc<dyn AssetSource>,
}

impl IndexSynchronizer {
    pub fn new(store: Arc<dyn IndexStore>, source: Arc<dyn AssetSource>) -> Self {
        Self { store, source }
    }

    /// Replace the index contents with everything the source lists. Blocks
    /// until the new contents are published; on error the previous index
    /// stays in place.
    pub async fn reindex_all(&self, config: &ReindexConfig) -> Result<ReindexReport, ReindexError> {
        config.validate()?;
        let start = Instant::now();

        info!(
            workers = config.worker_count,
            batch_size = config.batch_size,
            id_fetch_size = config.id_fetch_size,
            "Starting full reindex"
        );

        let ids = self.fetch_all_ids(config.id_fetch_size).await?;
        let batches: Vec<Vec<String>> = ids.chunks(config.batch_size).map(|chunk| chunk.to_vec()).collect();
        let batch_count = batches.len();

        let mut session = self.store.begin_rebuild().await?;

        let loaded = self.load_batches(session.as_mut(), batches, config.worker_count).await;
        let documents_indexed = match loaded {
            Ok(()) => session.commit().await?,
            Err(e) => {
                if let Err(abort_err) = session.abort().await {
                    warn!(error = %abort_err, "Failed to abort rebuild session");
                }
                error!(error = %e, elapsed_ms = start.elapsed().as_millis() as u64, "Reindex failed");
                return Err(e);
            }
        };

        let report = ReindexReport {
            documents_indexed,
            batches: batch_count,
            duration: start.elapsed(),
        };

        info!(
            documents = report.documents_indexed,
            batches = report.batches,
            duration_ms = report.duration.as_millis() as u64,
            "Reindex completed"
        );

        Ok(report)
    }

    async fn fetch_all_ids(&self, page_size: usize) -> Result<Vec<String>, ReindexError> {
        let mut ids = Vec::new();
        loop {
            let page = self.source.fetch_ids(ids.len(), page_size).await?;
            let last_page = page.len() < page_size;
            ids.extend(page);
            if last_page {
                break;
            }
        }
        Ok(ids)
    }

    /// Load batches on up to `workers` tasks and stage them as they arrive
    async fn load_batches(
        &self,
        session: &mut dyn RebuildSession,
        batches: Vec<Vec<String>>,
        workers: usize,
    ) -> Result<(), ReindexError> {
        let mut loads = stream::iter(batches)
            .map(|batch| {
                let source = Arc::clone(&self.source);
                tokio::spawn(async move { source.load_assets(&batch).await })
            })
            .buffer_unordered(workers);

        while let Some(joined) = loads.next().await {
            let assets: Vec<SearchableAsset> = joined.map_err(|e| ReindexError::Interrupted(e.to_string()))??;
            session.add_batch(&assets).await?;
        }

        Ok(())
    }
}
