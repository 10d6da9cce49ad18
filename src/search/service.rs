//! Search orchestration: validate, build predicate, execute, enrich

use crate::enrichment::{ContextKind, EnrichmentPipeline};
use crate::indexing::{AssetSource, IndexSynchronizer, ReindexConfig, ReindexReport};
use crate::models::{CompoundSearchRequest, IssueSearchRequest, SearchResult, SearchableAsset};
use crate::search::config::SearchConfig;
use crate::search::error::{SearchError, SearchExecutionError, ServiceResult};
use crate::search::executor::SearchExecutor;
use crate::search::index::{IndexStats, IndexStore};
use crate::search::predicate::PredicateBuilder;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Main search service
pub struct SearchService {
    /// Index store shared with the executor and synchronizer
    store: Arc<dyn IndexStore>,

    executor: SearchExecutor,

    synchronizer: IndexSynchronizer,

    enrichment: EnrichmentPipeline,

    /// Configuration
    config: SearchConfig,
}

impl SearchService {
    /// Create a new search service
    pub fn new(
        store: Arc<dyn IndexStore>,
        source: Arc<dyn AssetSource>,
        enrichment: EnrichmentPipeline,
        config: SearchConfig,
    ) -> Self {
        Self {
            executor: SearchExecutor::new(Arc::clone(&store), &config),
            synchronizer: IndexSynchronizer::new(Arc::clone(&store), source),
            store,
            enrichment,
            config,
        }
    }

    fn limit_or_default(&self, limit: Option<usize>) -> usize {
        limit.unwrap_or(self.config.default_limit)
    }

    /// Fuzzy search on asset names; `max_edits` defaults to 2
    pub async fn fuzzy_name_search(
        &self,
        name: &str,
        max_edits: Option<u8>,
        limit: Option<usize>,
    ) -> ServiceResult<Vec<SearchResult>> {
        self.executor
            .fuzzy_name_search(name, max_edits, self.limit_or_default(limit))
            .await
    }

    /// Token and phrase search across name, description and brand fields
    pub async fn multi_field_search(&self, term: &str, limit: Option<usize>) -> ServiceResult<Vec<SearchResult>> {
        self.executor
            .multi_field_search(term, self.limit_or_default(limit))
            .await
    }

    /// Filtered search with commentary driven by the request intent
    pub async fn compound_search(&self, request: &CompoundSearchRequest) -> ServiceResult<Vec<SearchResult>> {
        if self.config.refresh_before_compound {
            let report = self.synchronizer.reindex_all(&ReindexConfig::on_demand()).await?;
            debug!(documents = report.documents_indexed, "Refreshed index before compound search");
        }

        let predicate = PredicateBuilder::build(&request.filters, None);
        let results = self
            .executor
            .execute("compound search", &predicate, self.limit_or_default(request.limit))
            .await?;

        if results.is_empty() {
            self.probe_empty_result().await;
        }

        Ok(self
            .enrichment
            .enrich(results, &request.intent, &ContextKind::General)
            .await)
    }

    /// Search by issue criteria, optionally with issue-focused commentary
    pub async fn issue_search(&self, request: &IssueSearchRequest) -> ServiceResult<Vec<SearchResult>> {
        let criteria = request
            .criteria
            .as_ref()
            .ok_or_else(|| SearchError::InvalidArgument("issue criteria are required".to_string()))?;

        let intent = request.intent.as_deref().unwrap_or_default().trim();
        if request.enhance && intent.is_empty() {
            return Err(SearchError::InvalidArgument(
                "a search intent is required when enhancement is requested".to_string(),
            ));
        }

        let filters = request.filters.clone().unwrap_or_default();
        let predicate = PredicateBuilder::build(&filters, Some(criteria));
        let results = self
            .executor
            .execute("issue search", &predicate, self.limit_or_default(request.limit))
            .await?;

        if !request.enhance {
            return Ok(results);
        }

        Ok(self
            .enrichment
            .enrich(results, intent, &ContextKind::IssueFocused(criteria.clone()))
            .await)
    }

    /// Rebuild the whole index from the asset source
    pub async fn reindex_all(&self, config: &ReindexConfig) -> ServiceResult<ReindexReport> {
        Ok(self.synchronizer.reindex_all(config).await?)
    }

    /// Insert or replace a single asset
    pub async fn index_asset(&self, asset: &SearchableAsset) -> ServiceResult<()> {
        self.store
            .index_asset(asset)
            .await
            .map_err(|e| SearchExecutionError::new("index asset", e).into())
    }

    /// Remove a single asset
    pub async fn delete_asset(&self, id: &str) -> ServiceResult<()> {
        self.store
            .delete_asset(id)
            .await
            .map_err(|e| SearchExecutionError::new("delete asset", e).into())
    }

    /// Index statistics
    pub async fn stats(&self) -> ServiceResult<IndexStats> {
        self.store
            .stats()
            .await
            .map_err(|e| SearchExecutionError::new("index stats", e).into())
    }

    /// Log a sample of the index so an empty result can be told apart from an
    /// empty index. Never affects the returned results.
    async fn probe_empty_result(&self) {
        if !self.config.probe_on_empty {
            return;
        }

        match self.executor.probe(self.config.probe_size).await {
            Ok(sample) => {
                let ids: Vec<&str> = sample.iter().map(|r| r.id.as_str()).collect();
                info!(sample_size = sample.len(), sample_ids = ?ids, "Compound search matched nothing; index sample");
            }
            Err(e) => warn!(error = %e, "Index probe failed"),
        }
    }
}
