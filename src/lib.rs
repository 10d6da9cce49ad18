//! Asset search service
//!
//! Fuzzy, multi-field, compound and issue-based search over IT assets, backed
//! by a Tantivy index and optionally enriched with generated commentary.

pub mod api;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod indexing;
pub mod models;
pub mod search;

pub use error::{AppError, Result};
