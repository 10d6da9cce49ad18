use crate::api::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    let request_timeout = state.request_timeout;

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::health_check))
        .route("/health/ready", get(handlers::health_check))
        // Asset search
        .route("/v1/assets/search/fuzzy-name", get(handlers::fuzzy_name_search))
        .route("/v1/assets/search/multi-field", get(handlers::multi_field_search))
        .route("/v1/assets/search/compound", post(handlers::compound_search))
        .route("/v1/assets/search/issues", post(handlers::issue_search))
        // Index maintenance
        .route("/v1/assets/search/reindex", post(handlers::reindex))
        .route("/v1/assets/search/stats", get(handlers::index_stats))
        // Add state
        .with_state(state)
        // Add middleware
        .layer(TimeoutLayer::new(request_timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
