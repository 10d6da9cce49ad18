//! Index synchronization with the system of record

pub mod source;
pub mod synchronizer;

pub use source::{AssetSource, InMemoryAssetSource, SourceError};
pub use synchronizer::{IndexSynchronizer, ReindexConfig, ReindexError, ReindexReport};
