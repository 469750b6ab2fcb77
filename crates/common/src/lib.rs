//! Runweave Common Library
//!
//! Shared code for the Runweave services including:
//! - Core retrieval types (candidates, verdicts, source documents)
//! - Embedding client abstraction
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod embeddings;
pub mod errors;
pub mod metrics;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use embeddings::Embedder;
pub use errors::{AppError, Result};
pub use types::{Candidate, RelevanceVerdict, SourceDocument};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding dimension
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 768;
