//! HTTP routes exercised through the router

mod common;

use asset_search::api::{build_router, handlers::SearchResponse, AppState};
use asset_search::enrichment::{EnrichmentConfig, EnrichmentPipeline, GenerationError, TextGenerator};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::*;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

async fn app() -> Router {
    build_router(AppState::new(Arc::new(fixture_service().await)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn ids(body: &Value) -> Vec<String> {
    let response: SearchResponse = serde_json::from_value(body.clone()).unwrap();
    let mut ids: Vec<String> = response.results.into_iter().map(|r| r.id).collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_health_reports_indexed_documents() {
    let (status, body) = send(app().await, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["indexedDocuments"], 5);
}

#[tokio::test]
async fn test_fuzzy_name_route() {
    let (status, body) = send(
        app().await,
        get("/v1/assets/search/fuzzy-name?name=Dell%20Laptp&maxEdits=2&limit=5"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["id"], "a-1");
    assert_eq!(body["results"][0]["serialNumber"], "SN-a-1");
    assert!(body["results"][0]["llmCommentary"].is_null());
}

#[tokio::test]
async fn test_fuzzy_name_rejects_large_edit_distance() {
    let (status, body) = send(
        app().await,
        get("/v1/assets/search/fuzzy-name?name=Dell&maxEdits=3"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_blank_name_is_a_bad_request() {
    let (status, body) = send(app().await, get("/v1/assets/search/fuzzy-name?name=%20%20")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_multi_field_route() {
    let (status, body) = send(app().await, get("/v1/assets/search/multi-field?q=printer")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["a-3"]);
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_compound_route() {
    let request = post_json(
        "/v1/assets/search/compound",
        json!({
            "naturalLanguageQuery": "",
            "filters": {"brand": "Dell", "status": "ACTIVE"}
        }),
    );
    let (status, body) = send(app().await, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["a-1", "a-2"]);
}

#[tokio::test]
async fn test_compound_rejects_zero_limit() {
    let request = post_json("/v1/assets/search/compound", json!({"filters": {}, "limit": 0}));
    let (status, _) = send(app().await, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_issue_route_accepts_min_severity() {
    let request = post_json(
        "/v1/assets/search/issues",
        json!({
            "issueSearchCriteria": {"minSeverity": "HIGH", "includeResolved": true}
        }),
    );
    let (status, body) = send(app().await, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["a-1", "a-3"]);
}

#[tokio::test]
async fn test_issue_route_requires_criteria() {
    let request = post_json("/v1/assets/search/issues", json!({"filters": {"brand": "Dell"}}));
    let (status, body) = send(app().await, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_issue_route_requires_intent_for_enhancement() {
    let request = post_json(
        "/v1/assets/search/issues",
        json!({
            "issueSearchCriteria": {"hasOpenIssues": true},
            "enhanceWithLLM": true
        }),
    );
    let (status, _) = send(app().await, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reindex_route() {
    let app = app().await;

    let (status, body) = send(
        app.clone(),
        post_json("/v1/assets/search/reindex", json!({"batchSize": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documentsIndexed"], 5);
    assert_eq!(body["batches"], 3);

    let empty = Request::builder()
        .method(Method::POST)
        .uri("/v1/assets/search/reindex")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, empty).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["batches"], 1);
}

#[tokio::test]
async fn test_reindex_route_rejects_zero_workers() {
    let (status, body) = send(
        app().await,
        post_json("/v1/assets/search/reindex", json!({"workerCount": 0})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_reindex_route_rejects_malformed_body() {
    let (status, body) = send(
        app().await,
        post_json(
            "/v1/assets/search/reindex",
            json!({"workerCount": "lots", "batchSize": -3}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

/// Generator that never answers within the request deadline
struct StalledGenerator;

#[async_trait]
impl TextGenerator for StalledGenerator {
    async fn generate(&self, _system_prompt: &str, _context: &str) -> Result<String, GenerationError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok("late".to_string())
    }

    fn name(&self) -> &str {
        "stalled"
    }
}

#[tokio::test]
async fn test_slow_request_times_out() {
    let enrichment = EnrichmentPipeline::new(Arc::new(StalledGenerator), EnrichmentConfig::default());
    let state = AppState::new(Arc::new(service_with(fixture_assets(), enrichment).await))
        .with_request_timeout(Duration::from_millis(200));

    let request = post_json(
        "/v1/assets/search/compound",
        json!({"naturalLanguageQuery": "laptops", "filters": {"brand": "Dell"}}),
    );
    let (status, _) = send(build_router(state), request).await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
}
