//! Configuration management for Runweave services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Knowledge store configuration
    #[serde(default)]
    pub knowledge_store: KnowledgeStoreConfig,

    /// Completion model configuration (query expansion + relevance grading)
    #[serde(default)]
    pub model: ModelConfig,

    /// Retrieval pipeline tuning
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Embedding provider: openai-compatible, deterministic (tests/local)
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// API key for the embedding service
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model to use
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,

    /// Maximum retry attempts before the error propagates
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KnowledgeStoreConfig {
    /// Base URL of the knowledge store RPC endpoint
    #[serde(default = "default_store_url")]
    pub url: String,

    /// API key sent as a bearer token
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Provider: openai-compatible, scripted (tests)
    #[serde(default = "default_model_provider")]
    pub provider: String,

    /// API key for the completion service
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model used for query expansion
    #[serde(default = "default_expansion_model")]
    pub expansion_model: String,

    /// Model used for relevance grading (small and cheap on purpose)
    #[serde(default = "default_grading_model")]
    pub grading_model: String,

    /// Request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Maximum sub-queries produced by query expansion
    #[serde(default = "default_max_sub_queries")]
    pub max_sub_queries: usize,

    /// Top-K nearest documents fetched per sub-query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum similarity gate applied at result assembly
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_shutdown_timeout() -> u64 {
    10
}

fn default_embedding_provider() -> String {
    "openai-compatible".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text-v1.5".to_string()
}

fn default_embedding_dimension() -> usize {
    768
}

fn default_upstream_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_store_url() -> String {
    "http://localhost:54321/rest/v1".to_string()
}

fn default_model_provider() -> String {
    "openai-compatible".to_string()
}

fn default_expansion_model() -> String {
    "gpt-4o".to_string()
}

fn default_grading_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_sub_queries() -> usize {
    3
}

fn default_top_k() -> usize {
    4
}

fn default_min_similarity() -> f32 {
    0.3
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            api_key: None,
            api_base: None,
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_upstream_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for KnowledgeStoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            api_key: None,
            timeout_secs: default_upstream_timeout(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_model_provider(),
            api_key: None,
            api_base: None,
            expansion_model: default_expansion_model(),
            grading_model: default_grading_model(),
            timeout_secs: default_upstream_timeout(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_sub_queries: default_max_sub_queries(),
            top_k: default_top_k(),
            min_similarity: default_min_similarity(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Precedence (lowest to highest): defaults, config.toml,
    /// config.local.toml, APP__-prefixed environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name("config.local").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Server request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            embedding: EmbeddingConfig::default(),
            knowledge_store: KnowledgeStoreConfig::default(),
            model: ModelConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}
