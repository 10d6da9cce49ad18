//! System-of-record access for index rebuilds

use crate::models::SearchableAsset;
use async_trait::async_trait;
use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Errors reading from the system of record
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Asset source unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid asset data: {0}")]
    InvalidData(#[from] serde_json::Error),
}

/// Read-only view of the system of record
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// One page of asset ids in a stable order; an empty page ends the listing
    async fn fetch_ids(&self, offset: usize, limit: usize) -> Result<Vec<String>, SourceError>;

    /// Load the projections for `ids`; ids that no longer exist are skipped
    async fn load_assets(&self, ids: &[String]) -> Result<Vec<SearchableAsset>, SourceError>;
}

/// Asset source held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssetSource {
    assets: Arc<DashMap<String, SearchableAsset>>,
}

impl InMemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_assets(assets: impl IntoIterator<Item = SearchableAsset>) -> Self {
        let source = Self::new();
        for asset in assets {
            source.upsert(asset);
        }
        source
    }

    /// Load a JSON array of assets
    pub fn from_json_file(path: &Path) -> Result<Self, SourceError> {
        let data = std::fs::read_to_string(path)?;
        let assets: Vec<SearchableAsset> = serde_json::from_str(&data)?;
        info!(path = %path.display(), assets = assets.len(), "Loaded seed assets");
        Ok(Self::from_assets(assets))
    }

    pub fn upsert(&self, asset: SearchableAsset) {
        self.assets.insert(asset.id.clone(), asset);
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[async_trait]
impl AssetSource for InMemoryAssetSource {
    async fn fetch_ids(&self, offset: usize, limit: usize) -> Result<Vec<String>, SourceError> {
        let mut ids: Vec<String> = self.assets.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        Ok(ids.into_iter().skip(offset).take(limit).collect())
    }

    async fn load_assets(&self, ids: &[String]) -> Result<Vec<SearchableAsset>, SourceError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.assets.get(id).map(|entry| entry.value().clone()))
            .collect())
    }
}
