//! Commentary enrichment for search results
//!
//! This module provides:
//! - Context building for general and issue-focused analysis
//! - A text generation seam with a chat-completions backend
//! - A bounded-concurrency pipeline with per-item timeouts and caching

pub mod generator;
pub mod models;
pub mod pipeline;

pub use generator::{ChatCompletionGenerator, GenerationError, LlmConfig, TextGenerator};
pub use models::{ContextKind, EnrichmentConfig, ASSET_ANALYST_PROMPT, ISSUE_ANALYST_PROMPT};
pub use pipeline::{CacheStats, EnrichmentPipeline};
