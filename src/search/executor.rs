//! Read-only search execution against an [`IndexStore`]

use crate::models::SearchResult;
use crate::search::config::SearchConfig;
use crate::search::error::{IndexStoreResult, SearchError, SearchExecutionError, ServiceResult};
use crate::search::index::{IndexHit, IndexStore};
use crate::search::predicate::{BooleanNode, Leaf, PredicateNode};
use crate::search::schema::AssetField;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Edit distance for name searches when the caller gives none
pub const DEFAULT_NAME_EDITS: u8 = 2;

/// Fields covered by multi-field search, with their match boosts
const MULTI_FIELD_TARGETS: [(AssetField, f32); 4] = [
    (AssetField::Name, 2.0),
    (AssetField::Description, 1.0),
    (AssetField::BrandName, 1.0),
    (AssetField::BrandDescription, 1.0),
];

/// Boost applied to phrase matches on the name field
const NAME_PHRASE_BOOST: f32 = 3.0;

/// Largest window fetched while widening to settle a score tie at the cut
pub const MAX_TIE_WINDOW: usize = 5_000;

/// Executes predicates and maps hits to ranked results
#[derive(Clone)]
pub struct SearchExecutor {
    store: Arc<dyn IndexStore>,
    max_results: usize,
}

impl SearchExecutor {
    pub fn new(store: Arc<dyn IndexStore>, config: &SearchConfig) -> Self {
        Self {
            store,
            max_results: config.max_results,
        }
    }

    /// Fuzzy match on the asset name
    pub async fn fuzzy_name_search(
        &self,
        name: &str,
        max_edits: Option<u8>,
        limit: usize,
    ) -> ServiceResult<Vec<SearchResult>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SearchError::InvalidArgument("name query must not be blank".to_string()));
        }

        let edits = max_edits.unwrap_or(DEFAULT_NAME_EDITS);
        let predicate = Leaf::fuzzy(AssetField::Name, name, edits).into();
        self.execute("fuzzy name search", &predicate, limit).await
    }

    /// Token and phrase match over name, description and brand fields
    pub async fn multi_field_search(&self, term: &str, limit: usize) -> ServiceResult<Vec<SearchResult>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(SearchError::InvalidArgument("search term must not be blank".to_string()));
        }

        self.execute("multi-field search", &Self::multi_field_predicate(term), limit)
            .await
    }

    /// Either a token match or a phrase match must hit; name phrases rank highest
    pub fn multi_field_predicate(term: &str) -> PredicateNode {
        let mut tokens = BooleanNode::new();
        let mut phrases = BooleanNode::new();

        for (field, boost) in MULTI_FIELD_TARGETS {
            tokens = tokens.should(Leaf::matching(field, term).boosted(boost));

            let phrase = Leaf::phrase(field, term);
            phrases = phrases.should(if field == AssetField::Name {
                phrase.boosted(NAME_PHRASE_BOOST)
            } else {
                phrase
            });
        }

        BooleanNode::new()
            .should(tokens)
            .should(phrases)
            .with_minimum_should_match(1)
            .into()
    }

    /// Execute a predicate tree, best hits first
    pub async fn execute(
        &self,
        operation: &'static str,
        predicate: &PredicateNode,
        limit: usize,
    ) -> ServiceResult<Vec<SearchResult>> {
        let limit = limit.min(self.max_results);
        let start = Instant::now();

        let hits = self
            .fetch_past_ties(predicate, limit)
            .await
            .map_err(|e| SearchExecutionError::new(operation, e))?;

        let results = rank(hits, limit);

        info!(
            operation,
            results = results.len(),
            limit,
            duration_ms = start.elapsed().as_millis() as u64,
            "Search executed"
        );
        debug!(operation, ?predicate, "Executed predicate");

        Ok(results)
    }

    /// Fetch at least one hit past `limit`, widening while the hit at the cut
    /// ties with the last fetched one so id order decides across the whole
    /// tie group. Widening stops at [`MAX_TIE_WINDOW`].
    async fn fetch_past_ties(&self, predicate: &PredicateNode, limit: usize) -> IndexStoreResult<Vec<IndexHit>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut window = limit + 1;
        loop {
            let hits = self.store.query(predicate, window).await?;
            if hits.len() < window || window >= MAX_TIE_WINDOW {
                return Ok(hits);
            }

            let at_cut = hits.iter().map(|hit| hit.score).nth(limit - 1);
            let lowest = hits.iter().map(|hit| hit.score).fold(f32::INFINITY, f32::min);
            if at_cut != Some(lowest) {
                return Ok(hits);
            }

            debug!(limit, window, "Score tie at the result cut, widening fetch");
            window = (window * 2).min(MAX_TIE_WINDOW);
        }
    }

    /// Sample of the index used to diagnose empty result sets
    pub async fn probe(&self, size: usize) -> ServiceResult<Vec<SearchResult>> {
        self.execute("index probe", &PredicateNode::MatchAll, size).await
    }
}

/// Order hits by descending score, then ascending id, and map to results
pub fn rank(mut hits: Vec<IndexHit>, limit: usize) -> Vec<SearchResult> {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.asset.id.cmp(&b.asset.id))
    });
    hits.truncate(limit);

    hits.iter()
        .map(|hit| SearchResult::from_asset(&hit.asset, hit.score))
        .collect()
}
