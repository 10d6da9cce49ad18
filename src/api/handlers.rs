use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::indexing::{ReindexConfig, ReindexReport};
use crate::models::*;
use crate::search::IndexStats;
use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, indexed_documents) = match state.search.stats().await {
        Ok(stats) => ("healthy", Some(stats.total_documents)),
        Err(e) => {
            tracing::warn!(error = %e, "Index stats unavailable during health check");
            ("degraded", None)
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        indexed_documents,
    })
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub indexed_documents: Option<u64>,
}

/// Ranked results for any search endpoint
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub total: usize,
    pub took_ms: u64,
}

impl SearchResponse {
    fn new(results: Vec<SearchResult>, start: Instant) -> Self {
        Self {
            total: results.len(),
            results,
            took_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// Fuzzy search on asset names
pub async fn fuzzy_name_search(
    State(state): State<AppState>,
    Query(params): Query<FuzzyNameParams>,
) -> Result<Json<SearchResponse>> {
    params.validate()?;
    let start = Instant::now();

    let results = state
        .search
        .fuzzy_name_search(&params.name, params.max_edits, params.limit)
        .await?;

    Ok(Json(SearchResponse::new(results, start)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FuzzyNameParams {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(range(max = 2))]
    pub max_edits: Option<u8>,
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

/// Token and phrase search across name, description and brand
pub async fn multi_field_search(
    State(state): State<AppState>,
    Query(params): Query<MultiFieldParams>,
) -> Result<Json<SearchResponse>> {
    params.validate()?;
    let start = Instant::now();

    let results = state.search.multi_field_search(&params.q, params.limit).await?;

    Ok(Json(SearchResponse::new(results, start)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct MultiFieldParams {
    #[validate(length(min = 1, max = 512))]
    pub q: String,
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

/// Filtered search with generated commentary
pub async fn compound_search(
    State(state): State<AppState>,
    Json(request): Json<CompoundSearchRequest>,
) -> Result<Json<SearchResponse>> {
    request.validate()?;
    let start = Instant::now();

    let results = state.search.compound_search(&request).await?;

    Ok(Json(SearchResponse::new(results, start)))
}

/// Search by issue criteria
pub async fn issue_search(
    State(state): State<AppState>,
    Json(request): Json<IssueSearchRequest>,
) -> Result<Json<SearchResponse>> {
    request.validate()?;
    let start = Instant::now();

    let results = state.search.issue_search(&request).await?;

    Ok(Json(SearchResponse::new(results, start)))
}

/// Rebuild the index; a non-empty body overrides the configured rebuild
/// parameters and must parse in full
pub async fn reindex(State(state): State<AppState>, body: Bytes) -> Result<Json<ReindexReport>> {
    let config = if body.iter().all(u8::is_ascii_whitespace) {
        state.reindex
    } else {
        serde_json::from_slice::<ReindexConfig>(&body)
            .map_err(|e| AppError::Validation(format!("invalid reindex parameters: {}", e)))?
    };
    let report = state.search.reindex_all(&config).await?;
    Ok(Json(report))
}

/// Index statistics
pub async fn index_stats(State(state): State<AppState>) -> Result<Json<IndexStats>> {
    Ok(Json(state.search.stats().await?))
}
