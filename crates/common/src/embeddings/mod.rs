//! Embedding service abstraction
//!
//! Turns text into fixed-length vectors. Two implementations:
//! - `OpenAICompatibleEmbedder`: HTTP client for any `/embeddings` endpoint
//!   speaking the OpenAI wire shape (incl. Nomic-style servers)
//! - `DeterministicEmbedder`: in-process, hash-seeded vectors for tests and
//!   local runs; identical input always yields the identical vector

use crate::config::EmbeddingConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding generation
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts (batch)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;
}

/// HTTP embedding client for OpenAI-compatible endpoints
pub struct OpenAICompatibleEmbedder {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    dimension: usize,
    base_url: String,
    max_elapsed: Duration,
}

#[derive(Serialize)]
struct EmbeddingRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAICompatibleEmbedder {
    /// Create a new embedder from configuration
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            dimension: config.dimension,
            base_url: config
                .api_base
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            // Saturate both steps; a huge configured retry count must clamp,
            // not overflow.
            max_elapsed: Duration::from_millis(
                2u64.saturating_pow(config.max_retries).saturating_mul(100),
            ),
        })
    }

    /// Make the request with exponential backoff
    ///
    /// Non-2xx responses from the endpoint are permanent failures; transport
    /// errors are retried until the backoff budget is exhausted. After that
    /// the error propagates and aborts the enclosing retrieval step.
    async fn request_with_retry(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(100))
            .with_max_elapsed_time(Some(self.max_elapsed))
            .build();

        backoff::future::retry(policy, || async {
            match self.make_request(texts).await {
                Ok(embeddings) => Ok(embeddings),
                Err(e @ AppError::HttpClient(_)) => {
                    tracing::warn!(error = %e, "Embedding request failed, retrying");
                    Err(backoff::Error::transient(e))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        })
        .await
    }

    async fn make_request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);

        let request = EmbeddingRequest {
            input: texts.to_vec(),
            model: self.model.clone(),
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EmbeddingError {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: EmbeddingResponse =
            response.json().await.map_err(|e| AppError::EmbeddingError {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAICompatibleEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        // Newlines degrade similarity quality on most embedding models
        let input = text.replace('\n', " ");
        let embeddings = self.request_with_retry(&[input]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| AppError::EmbeddingError {
                message: "Empty response".to_string(),
            })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        const BATCH_SIZE: usize = 100;

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let embeddings = self.request_with_retry(chunk).await?;
            all_embeddings.extend(embeddings);
        }

        Ok(all_embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Deterministic in-process embedder for tests and local runs
///
/// Seeds every component from an FNV-1a hash of the input, so identical input
/// always produces the identical vector (matching the determinism contract of
/// real embedding services within a model version).
pub struct DeterministicEmbedder {
    dimension: usize,
}

impl DeterministicEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn fnv1a(text: &str, salt: u64) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325 ^ salt;
        for byte in text.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        hash
    }
}

#[async_trait]
impl Embedder for DeterministicEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector: Vec<f32> = (0..self.dimension)
            .map(|i| {
                let h = Self::fnv1a(text, i as u64);
                // Map to [-1, 1]
                (h as f64 / u64::MAX as f64 * 2.0 - 1.0) as f32
            })
            .collect();

        // L2-normalize so cosine similarity behaves like a real model's output
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    fn model_name(&self) -> &str {
        "deterministic-embedding"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Create an embedder based on configuration
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "openai-compatible" => Ok(Arc::new(OpenAICompatibleEmbedder::new(config)?)),
        "deterministic" => Ok(Arc::new(DeterministicEmbedder::new(config.dimension))),
        other => Err(AppError::Configuration {
            message: format!("Unknown embedding provider: {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_deterministic_embedder_is_deterministic() {
        let embedder = DeterministicEmbedder::new(768);
        let a = embedder.embed("configure the ingress").await.unwrap();
        let b = embedder.embed("configure the ingress").await.unwrap();
        let c = embedder.embed("something else entirely").await.unwrap();
        assert_eq!(a.len(), 768);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_deterministic_embedder_is_normalized() {
        let embedder = DeterministicEmbedder::new(64);
        let v = embedder.embed("some text").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_large_retry_count_saturates_backoff_budget() {
        let config = EmbeddingConfig {
            max_retries: 64,
            ..EmbeddingConfig::default()
        };
        let embedder = OpenAICompatibleEmbedder::new(&config).unwrap();
        assert_eq!(embedder.max_elapsed, Duration::from_millis(u64::MAX));
    }

    #[tokio::test]
    async fn test_http_embedder_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [0.1, 0.2, 0.3]}]
            })))
            .mount(&server)
            .await;

        let config = EmbeddingConfig {
            api_base: Some(server.uri()),
            dimension: 3,
            ..EmbeddingConfig::default()
        };
        let embedder = OpenAICompatibleEmbedder::new(&config).unwrap();
        let vector = embedder.embed("hello").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_http_embedder_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let config = EmbeddingConfig {
            api_base: Some(server.uri()),
            ..EmbeddingConfig::default()
        };
        let embedder = OpenAICompatibleEmbedder::new(&config).unwrap();
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, AppError::EmbeddingError { .. }));
    }
}
