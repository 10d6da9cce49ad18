use crate::enrichment::generator::{GenerationError, TextGenerator};
use crate::enrichment::models::{ContextKind, EnrichmentConfig};
use crate::models::SearchResult;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub valid_entries: usize,
}

/// Attaches generated commentary to search results.
///
/// Enrichment is opportunistic: failures leave a result's commentary unset and
/// never fail the search that requested it.
#[derive(Clone)]
pub struct EnrichmentPipeline {
    /// Text generation backend; `None` disables enrichment
    generator: Option<Arc<dyn TextGenerator>>,

    /// Commentary cache keyed by (kind, intent, context)
    cache: Arc<DashMap<String, (String, Instant)>>,

    /// Configuration
    config: Arc<EnrichmentConfig>,
}

impl EnrichmentPipeline {
    /// Create a new enrichment pipeline
    pub fn new(generator: Arc<dyn TextGenerator>, config: EnrichmentConfig) -> Self {
        Self {
            generator: Some(generator),
            cache: Arc::new(DashMap::new()),
            config: Arc::new(config),
        }
    }

    /// Pipeline that returns results untouched
    pub fn disabled() -> Self {
        Self {
            generator: None,
            cache: Arc::new(DashMap::new()),
            config: Arc::new(EnrichmentConfig {
                enabled: false,
                ..Default::default()
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled && self.generator.is_some()
    }

    /// Add commentary to each result, preserving length and order
    pub async fn enrich(&self, results: Vec<SearchResult>, intent: &str, kind: &ContextKind) -> Vec<SearchResult> {
        let intent = intent.trim();
        if intent.is_empty() || results.is_empty() {
            return results;
        }
        let Some(generator) = self.generator.as_ref().filter(|_| self.config.enabled) else {
            debug!("Enrichment disabled, returning results unchanged");
            return results;
        };

        let start = Instant::now();
        let total = results.len();

        let enriched: Vec<SearchResult> = stream::iter(results)
            .map(|result| self.enrich_one(generator, result, intent, kind))
            .buffered(self.config.max_concurrent.max(1))
            .collect()
            .await;

        let succeeded = enriched.iter().filter(|r| r.commentary.is_some()).count();
        info!(
            kind = kind.label(),
            total,
            succeeded,
            failed = total - succeeded,
            duration_ms = start.elapsed().as_millis() as u64,
            "Enrichment completed"
        );

        enriched
    }

    async fn enrich_one(
        &self,
        generator: &Arc<dyn TextGenerator>,
        mut result: SearchResult,
        intent: &str,
        kind: &ContextKind,
    ) -> SearchResult {
        let context = kind.build_context(&result, intent);
        let cache_key = format!("{}\u{1f}{}", kind.label(), context);

        if let Some(cached) = self.get_cached(&cache_key) {
            debug!(asset_id = %result.id, "Using cached commentary");
            result.commentary = Some(cached);
            return result;
        }

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let outcome = match timeout(timeout_duration, generator.generate(kind.system_prompt(), &context)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(GenerationError::Timeout(self.config.timeout_secs)),
        };

        match outcome {
            Ok(text) => {
                let text = text.trim().to_string();
                debug!(asset_id = %result.id, chars = text.len(), "Generated commentary");
                self.cache_commentary(cache_key, text.clone());
                result.commentary = Some(text);
            }
            Err(e) => {
                warn!(
                    asset_id = %result.id,
                    generator = generator.name(),
                    error = %e,
                    "Failed to generate commentary"
                );
            }
        }

        result
    }

    fn get_cached(&self, key: &str) -> Option<String> {
        if self.config.cache_ttl_secs == 0 {
            return None;
        }
        let entry = self.cache.get(key)?;
        let (commentary, cached_at) = entry.value();
        if cached_at.elapsed().as_secs() < self.config.cache_ttl_secs {
            Some(commentary.clone())
        } else {
            drop(entry);
            self.cache.remove(key);
            None
        }
    }

    fn cache_commentary(&self, key: String, commentary: String) {
        if self.config.cache_ttl_secs > 0 {
            self.cache.insert(key, (commentary, Instant::now()));
        }
    }

    /// Drop expired cache entries
    pub fn cleanup_cache(&self) {
        let ttl = self.config.cache_ttl_secs;
        self.cache.retain(|_, (_, cached_at)| cached_at.elapsed().as_secs() < ttl);
    }

    /// Spawn a task that drops expired cache entries every `every`
    pub fn spawn_cache_cleanup(&self, every: Duration) -> Option<tokio::task::JoinHandle<()>> {
        if !self.is_enabled() || self.config.cache_ttl_secs == 0 {
            return None;
        }

        let pipeline = self.clone();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                pipeline.cleanup_cache();
                debug!(entries = pipeline.cache.len(), "Enrichment cache cleaned");
            }
        }))
    }

    pub fn cache_stats(&self) -> CacheStats {
        let ttl = self.config.cache_ttl_secs;
        let total_entries = self.cache.len();
        let expired_entries = self
            .cache
            .iter()
            .filter(|entry| entry.value().1.elapsed().as_secs() >= ttl)
            .count();

        CacheStats {
            total_entries,
            expired_entries,
            valid_entries: total_entries - expired_entries,
        }
    }
}
