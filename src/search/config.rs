//! Search configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Path to the search index directory
    pub index_path: PathBuf,

    /// Index writer heap size in bytes (default: 50MB)
    pub writer_heap_size: usize,

    /// Upper bound on results for any single search
    pub max_results: usize,

    /// Result count when the caller gives no limit
    pub default_limit: usize,

    /// Log a match-all sample when a compound search comes back empty
    pub probe_on_empty: bool,

    /// Number of documents in the match-all sample
    pub probe_size: usize,

    /// Rebuild the whole index before every compound search
    pub refresh_before_compound: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("./data/search_index"),
            writer_heap_size: 50_000_000, // 50MB
            max_results: 1000,
            default_limit: 20,
            probe_on_empty: true,
            probe_size: 5,
            refresh_before_compound: false,
        }
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn index_path(mut self, path: PathBuf) -> Self {
        self.config.index_path = path;
        self
    }

    pub fn writer_heap_size(mut self, size: usize) -> Self {
        self.config.writer_heap_size = size;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.config.max_results = max;
        self
    }

    pub fn default_limit(mut self, limit: usize) -> Self {
        self.config.default_limit = limit;
        self
    }

    pub fn probe_on_empty(mut self, enabled: bool) -> Self {
        self.config.probe_on_empty = enabled;
        self
    }

    pub fn probe_size(mut self, size: usize) -> Self {
        self.config.probe_size = size;
        self
    }

    pub fn refresh_before_compound(mut self, enabled: bool) -> Self {
        self.config.refresh_before_compound = enabled;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
