//! Error types for search operations

use crate::error::AppError;
use crate::indexing::ReindexError;

/// Result type for index store operations
pub type IndexStoreResult<T> = std::result::Result<T, IndexStoreError>;

/// Result type for search service operations
pub type ServiceResult<T> = std::result::Result<T, SearchError>;

/// Errors raised by the index engine
#[derive(Debug, thiserror::Error)]
pub enum IndexStoreError {
    /// Index initialization failed
    #[error("Index initialization failed: {0}")]
    IndexInitFailed(String),

    /// Existing index was written with a different field mapping
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Predicate could not be translated to an index query
    #[error("Unsupported predicate: {0}")]
    UnsupportedPredicate(String),

    /// Search execution failed
    #[error("Search execution failed: {0}")]
    SearchFailed(String),

    /// Document indexing failed
    #[error("Document indexing failed: {0}")]
    IndexingFailed(String),

    /// Stored document could not be mapped back to an asset
    #[error("Corrupt stored document: {0}")]
    CorruptDocument(String),

    /// Rebuild session was used after commit or abort
    #[error("Rebuild session already finished")]
    SessionFinished,

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Tantivy error
    #[error("Tantivy error: {0}")]
    TantivyError(String),
}

impl From<tantivy::TantivyError> for IndexStoreError {
    fn from(err: tantivy::TantivyError) -> Self {
        IndexStoreError::TantivyError(err.to_string())
    }
}

/// A search could not be carried out by the index engine
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed: {source}")]
pub struct SearchExecutionError {
    pub operation: &'static str,
    #[source]
    pub source: IndexStoreError,
}

impl SearchExecutionError {
    pub fn new(operation: &'static str, source: IndexStoreError) -> Self {
        Self { operation, source }
    }
}

/// Errors surfaced by the search service
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Caller supplied an unusable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Execution(#[from] SearchExecutionError),

    #[error(transparent)]
    Reindex(#[from] ReindexError),
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidArgument(msg) => AppError::Validation(msg),
            SearchError::Execution(err) => AppError::SearchExecution(err.to_string()),
            SearchError::Reindex(ReindexError::InvalidConfig(msg)) => AppError::Validation(msg),
            SearchError::Reindex(err) => AppError::Reindex(err.to_string()),
        }
    }
}
