//! Knowledge store abstraction
//!
//! Given a query vector, returns the nearest candidate documents with a
//! similarity score. At most `k` results; an empty result is valid, not an
//! error. Two implementations:
//! - `HttpKnowledgeStore`: calls a `match_artifacts`-style RPC endpoint
//! - `InMemoryKnowledgeStore`: cosine similarity over in-process documents,
//!   for tests and local runs

use async_trait::async_trait;
use runweave_common::config::KnowledgeStoreConfig;
use runweave_common::errors::{AppError, Result};
use runweave_common::types::Candidate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Optional constraints applied server-side to a similarity search
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchFilter {
    /// Restrict matches to one knowledge domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
}

/// Trait for similarity search over the knowledge store
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Return the top-k nearest documents for the query vector
    async fn search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<Candidate>>;
}

/// HTTP knowledge store speaking a PostgREST-style RPC wire format
pub struct HttpKnowledgeStore {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Serialize)]
struct MatchRequest<'a> {
    query_embedding: &'a [f32],
    match_count: usize,
    filter: &'a SearchFilter,
}

#[derive(Deserialize)]
struct MatchRow {
    artifact_id: String,
    url: String,
    title: String,
    summary: String,
    parsed_text: String,
    similarity: f32,
}

impl From<MatchRow> for Candidate {
    fn from(row: MatchRow) -> Self {
        Candidate {
            id: row.artifact_id,
            url: row.url,
            title: row.title,
            summary: row.summary,
            content: row.parsed_text,
            similarity: row.similarity,
        }
    }
}

impl HttpKnowledgeStore {
    /// Create a new store client from configuration
    pub fn new(config: &KnowledgeStoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl KnowledgeStore for HttpKnowledgeStore {
    async fn search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<Candidate>> {
        let url = format!("{}/rpc/match_artifacts", self.base_url);

        let request = MatchRequest {
            query_embedding: embedding,
            match_count: k,
            filter,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::SearchError {
                message: format!("match_artifacts failed with {}: {}", status, body),
            });
        }

        let rows: Vec<MatchRow> = response.json().await.map_err(|e| AppError::SearchError {
            message: format!("Failed to parse match_artifacts response: {}", e),
        })?;

        Ok(rows.into_iter().map(Candidate::from).collect())
    }
}

/// Document stored in the in-memory knowledge store
#[derive(Debug, Clone)]
struct StoredDocument {
    candidate: Candidate,
    embedding: Vec<f32>,
    domain_id: Option<String>,
}

/// In-memory knowledge store for tests and local runs
#[derive(Default)]
pub struct InMemoryKnowledgeStore {
    documents: RwLock<Vec<StoredDocument>>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one document with its embedding
    ///
    /// The `similarity` on the stored candidate is ignored; search fills it
    /// with the cosine similarity against the query vector.
    pub async fn insert(&self, candidate: Candidate, embedding: Vec<f32>) {
        self.insert_in_domain(candidate, embedding, None).await;
    }

    pub async fn insert_in_domain(
        &self,
        candidate: Candidate,
        embedding: Vec<f32>,
        domain_id: Option<String>,
    ) {
        self.documents.write().await.push(StoredDocument {
            candidate,
            embedding,
            domain_id,
        });
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<Candidate>> {
        let documents = self.documents.read().await;

        let mut scored: Vec<Candidate> = documents
            .iter()
            .filter(|doc| match &filter.domain_id {
                Some(domain) => doc.domain_id.as_deref() == Some(domain.as_str()),
                None => true,
            })
            .map(|doc| {
                let mut candidate = doc.candidate.clone();
                candidate.similarity = Self::cosine_similarity(embedding, &doc.embedding);
                candidate
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);

        Ok(scored)
    }
}

/// Create a knowledge store client from configuration
pub fn create_knowledge_store(config: &KnowledgeStoreConfig) -> Result<Arc<dyn KnowledgeStore>> {
    Ok(Arc::new(HttpKnowledgeStore::new(config)?))
}
