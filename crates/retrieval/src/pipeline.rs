//! Pipeline orchestration
//!
//! Short-lived, per-request orchestration of the retrieval stages:
//! expand -> retrieve (fan-out per sub-query) -> dedup -> grade (fan-out per
//! candidate) -> assemble. The embed/search/grade calls are the only
//! suspension points.
//!
//! Retrieval fan-out is all-or-nothing: one failed sub-query retrieval aborts
//! the whole step. Partial knowledge is worse than a clear failure for a
//! grounded-answer system, so no partial results are silently dropped.

use crate::assemble::assemble_results;
use crate::dedup::dedup_candidates;
use crate::expander::QueryExpander;
use crate::grader::RelevanceGrader;
use crate::model::CompletionModel;
use crate::store::{KnowledgeStore, SearchFilter};
use futures::future::try_join_all;
use runweave_common::config::RetrievalConfig;
use runweave_common::embeddings::Embedder;
use runweave_common::errors::{AppError, Result};
use runweave_common::metrics;
use runweave_common::types::{Candidate, SourceDocument};
use std::sync::Arc;
use std::time::Instant;

/// The retrieval-and-grading pipeline
///
/// Cheap to clone; every invocation owns its candidate and verdict sets, so
/// one pipeline value can serve concurrent requests without locks.
#[derive(Clone)]
pub struct RetrievalPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn KnowledgeStore>,
    expander: Arc<QueryExpander>,
    grader: Arc<RelevanceGrader>,
    config: RetrievalConfig,
}

impl std::fmt::Debug for RetrievalPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RetrievalPipeline`]
pub struct RetrievalPipelineBuilder {
    embedder: Option<Arc<dyn Embedder>>,
    store: Option<Arc<dyn KnowledgeStore>>,
    model: Option<Arc<dyn CompletionModel>>,
    expansion_model: String,
    grading_model: String,
    config: RetrievalConfig,
}

impl RetrievalPipelineBuilder {
    pub fn new() -> Self {
        Self {
            embedder: None,
            store: None,
            model: None,
            expansion_model: "gpt-4o".to_string(),
            grading_model: "gpt-4o-mini".to_string(),
            config: RetrievalConfig::default(),
        }
    }

    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn store(mut self, store: Arc<dyn KnowledgeStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn model(mut self, model: Arc<dyn CompletionModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn expansion_model(mut self, name: impl Into<String>) -> Self {
        self.expansion_model = name.into();
        self
    }

    pub fn grading_model(mut self, name: impl Into<String>) -> Self {
        self.grading_model = name.into();
        self
    }

    pub fn config(mut self, config: RetrievalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<RetrievalPipeline> {
        let embedder = self.embedder.ok_or_else(|| AppError::Configuration {
            message: "Pipeline requires an embedder".to_string(),
        })?;
        let store = self.store.ok_or_else(|| AppError::Configuration {
            message: "Pipeline requires a knowledge store".to_string(),
        })?;
        let model = self.model.ok_or_else(|| AppError::Configuration {
            message: "Pipeline requires a completion model".to_string(),
        })?;

        Ok(RetrievalPipeline {
            embedder,
            store,
            expander: Arc::new(QueryExpander::new(model.clone(), self.expansion_model)),
            grader: Arc::new(RelevanceGrader::new(model, self.grading_model)),
            config: self.config,
        })
    }
}

impl Default for RetrievalPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetrievalPipeline {
    pub fn builder() -> RetrievalPipelineBuilder {
        RetrievalPipelineBuilder::new()
    }

    /// Answer one question: expand it, then retrieve sources for the expansion
    #[tracing::instrument(skip(self, filter))]
    pub async fn answer_sources(
        &self,
        question: &str,
        filter: &SearchFilter,
    ) -> Result<Vec<SourceDocument>> {
        let sub_queries = self.expander.expand(question).await?;
        self.retrieve(&sub_queries, filter).await
    }

    /// Retrieve graded sources for an already-expanded sub-query set
    ///
    /// This is the single tool-style invocation the generation step calls,
    /// possibly several times per conversation turn.
    #[tracing::instrument(skip_all, fields(sub_query_count = sub_queries.len()))]
    pub async fn retrieve(
        &self,
        sub_queries: &[String],
        filter: &SearchFilter,
    ) -> Result<Vec<SourceDocument>> {
        let start = Instant::now();

        // Fan out one retrieval task per sub-query; any failure aborts the
        // whole step before grading starts.
        let per_query = try_join_all(
            sub_queries
                .iter()
                .map(|sub_query| self.retrieve_for_sub_query(sub_query, filter)),
        )
        .await?;

        let merged: Vec<Candidate> = per_query.into_iter().flatten().collect();
        let retrieved_count = merged.len();

        let unique = dedup_candidates(merged);
        tracing::debug!(
            retrieved = retrieved_count,
            unique = unique.len(),
            "Deduplicated candidates"
        );

        let verdicts = self.grader.grade_all(&unique, sub_queries).await;

        let sources = assemble_results(&unique, &verdicts, self.config.min_similarity);

        metrics::record_retrieval(
            start.elapsed().as_secs_f64(),
            retrieved_count,
            sources.len(),
        );
        tracing::info!(
            sub_queries = sub_queries.len(),
            candidates = retrieved_count,
            sources = sources.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Retrieval round complete"
        );

        Ok(sources)
    }

    /// Embed one sub-query and fetch its top-K nearest documents
    ///
    /// All K come back regardless of score; the similarity gate is applied at
    /// assembly, not here.
    async fn retrieve_for_sub_query(
        &self,
        sub_query: &str,
        filter: &SearchFilter,
    ) -> Result<Vec<Candidate>> {
        let embedding = self.embedder.embed(sub_query).await?;
        self.store
            .search(&embedding, self.config.top_k, filter)
            .await
    }
}
