pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::indexing::ReindexConfig;
use crate::search::SearchService;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Requests still running after this long are answered with 408
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,

    /// Rebuild parameters used when a reindex request has no body
    pub reindex: ReindexConfig,

    pub request_timeout: Duration,

    pub started_at: Instant,
}

impl AppState {
    pub fn new(search: Arc<SearchService>) -> Self {
        Self {
            search,
            reindex: ReindexConfig::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            started_at: Instant::now(),
        }
    }

    /// Set the default rebuild parameters
    pub fn with_reindex_config(mut self, reindex: ReindexConfig) -> Self {
        self.reindex = reindex;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
