use asset_search::{
    api::{build_router, AppState},
    config::{Config, ObservabilityConfig},
    enrichment::{ChatCompletionGenerator, EnrichmentPipeline},
    indexing::InMemoryAssetSource,
    search::{IndexManager, SearchService},
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    init_tracing(&config.observability);

    tracing::info!("Starting {} v{}", config.observability.service_name, env!("CARGO_PKG_VERSION"));

    // Open or create the index
    let store = Arc::new(IndexManager::new(config.search.clone()).await?);
    tracing::info!(path = %config.search.index_path.display(), "Search index ready");

    // Asset source
    let source = match &config.source.seed_path {
        Some(path) => InMemoryAssetSource::from_json_file(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Failed to load seed assets");
            tracing::warn!("Continuing with an empty asset source");
            InMemoryAssetSource::new()
        }),
        None => InMemoryAssetSource::new(),
    };
    tracing::info!(assets = source.len(), "Asset source initialized");

    // Commentary enrichment
    let enrichment = build_enrichment(&config);
    let _cache_cleanup = enrichment.spawn_cache_cleanup(Duration::from_secs(60));

    let search = Arc::new(SearchService::new(
        store,
        Arc::new(source),
        enrichment,
        config.search.clone(),
    ));

    if config.source.reindex_on_startup {
        let report = search.reindex_all(&config.reindex).await.map_err(|e| {
            tracing::error!(error = %e, "Startup reindex failed");
            e
        })?;
        tracing::info!(
            documents = report.documents_indexed,
            duration_ms = report.duration.as_millis() as u64,
            "Startup reindex completed"
        );
    }

    let app_state = AppState::new(search)
        .with_reindex_config(config.reindex)
        .with_request_timeout(Duration::from_secs(config.server.request_timeout_secs));
    let app = build_router(app_state);

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Search API: http://{}/v1/assets/search", http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down gracefully");
    Ok(())
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "asset_search={level},tower_http={level}",
            level = observability.log_level
        )
        .into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    if observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_enrichment(config: &Config) -> EnrichmentPipeline {
    if !config.enrichment.enabled {
        tracing::info!("Commentary enrichment disabled in configuration");
        return EnrichmentPipeline::disabled();
    }

    match ChatCompletionGenerator::from_env(&config.llm) {
        Ok(Some(generator)) => {
            tracing::info!(model = %config.llm.model, "Commentary enrichment enabled");
            EnrichmentPipeline::new(Arc::new(generator), config.enrichment.clone())
        }
        Ok(None) => {
            tracing::warn!(
                env = %config.llm.api_key_env,
                "No API key found; continuing without commentary"
            );
            EnrichmentPipeline::disabled()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to initialize text generator; continuing without commentary");
            EnrichmentPipeline::disabled()
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
