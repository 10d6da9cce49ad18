//! Asset search powered by Tantivy
//!
//! This module provides:
//!
//! - **Fuzzy name search**: typo-tolerant matching on asset names
//! - **Multi-field search**: token and phrase matching across name, description and brand
//! - **Compound search**: structured filters plus a natural-language intent
//! - **Issue search**: filters plus issue criteria (open issues, count, priority)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           Search Service                         │
//! ├─────────────────────────────────────────────────┤
//! │  - fuzzy_name_search()  - multi_field_search()  │
//! │  - compound_search()    - issue_search()        │
//! │  - reindex_all()                                │
//! └─────────────────────────────────────────────────┘
//!          │                         │
//!          ▼                         ▼
//! ┌──────────────────────┐  ┌──────────────────────┐
//! │ PredicateBuilder     │  │ EnrichmentPipeline   │
//! │ SearchExecutor       │  │ IndexSynchronizer    │
//! └──────────────────────┘  └──────────────────────┘
//!          │
//!          ▼
//! ┌─────────────────────────────────────────────────┐
//! │           IndexStore (IndexManager)              │
//! ├─────────────────────────────────────────────────┤
//! │  - Explicit, versioned field mapping             │
//! │  - Predicate → query translation                 │
//! │  - Atomic full rebuilds                          │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use asset_search::enrichment::EnrichmentPipeline;
//! use asset_search::indexing::InMemoryAssetSource;
//! use asset_search::search::{IndexManager, SearchConfig, SearchService};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SearchConfig::default();
//!     let store = Arc::new(IndexManager::new(config.clone()).await?);
//!     let source = Arc::new(InMemoryAssetSource::new());
//!     let search = SearchService::new(store, source, EnrichmentPipeline::disabled(), config);
//!
//!     let results = search.fuzzy_name_search("Dell Laptp", Some(2), Some(5)).await?;
//!     println!("Found {} assets", results.len());
//!
//!     Ok(())
//! }
//! ```

mod config;
mod document;
mod error;
mod executor;
mod index;
mod predicate;
mod query;
mod schema;
mod service;

pub use config::{SearchConfig, SearchConfigBuilder};
pub use document::{asset_from_doc, field_values, FieldValue, SearchDocument};
pub use error::{IndexStoreError, IndexStoreResult, SearchError, SearchExecutionError, ServiceResult};
pub use executor::{rank, SearchExecutor, DEFAULT_NAME_EDITS};
pub use index::{IndexHit, IndexManager, IndexStats, IndexStore, RebuildSession};
pub use predicate::{
    BooleanNode, FilterKey, Leaf, LeafKind, PredicateBuilder, PredicateNode, FILTER_EDIT_DISTANCE,
    MAX_EDIT_DISTANCE,
};
pub use query::QueryBuilder;
pub use schema::{
    register_tokenizers, AssetField, AssetSchema, FieldKind, FieldMapping, FIELD_MAPPINGS, SCHEMA_VERSION,
};
pub use service::SearchService;
