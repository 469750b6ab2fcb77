//! Retrieval tool handler
//!
//! One invocation per call: the generation step may issue several per
//! conversation turn, sequentially or in response to its own planning.

use crate::AppState;
use axum::{extract::State, Json};
use runweave_common::errors::{AppError, Result};
use runweave_common::types::SourceDocument;
use runweave_retrieval::store::SearchFilter;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

/// Retrieval request
#[derive(Debug, Deserialize, Validate)]
pub struct RetrieveRequest {
    /// The user's question
    #[validate(length(min = 1, max = 1000))]
    pub question: String,

    /// Pre-expanded sub-queries; when present the expansion step is skipped
    #[serde(default)]
    pub sub_queries: Option<Vec<String>>,

    /// Restrict the search to one knowledge domain
    #[serde(default)]
    pub domain_id: Option<String>,
}

/// Retrieval response
#[derive(Serialize)]
pub struct RetrieveResponse {
    pub sources: Vec<SourceDocument>,
    pub processing_time_ms: u64,
}

/// Run one retrieval-and-grading round
pub async fn retrieve(
    State(state): State<AppState>,
    Json(request): Json<RetrieveRequest>,
) -> Result<Json<RetrieveResponse>> {
    let start = Instant::now();

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let filter = SearchFilter {
        domain_id: request.domain_id,
    };

    let sources = match request.sub_queries {
        Some(mut sub_queries) if !sub_queries.is_empty() => {
            // Callers supplying their own expansion still get the sub-query
            // bound enforced.
            sub_queries.truncate(state.config.retrieval.max_sub_queries);
            state.pipeline.retrieve(&sub_queries, &filter).await?
        }
        _ => {
            state
                .pipeline
                .answer_sources(&request.question, &filter)
                .await?
        }
    };

    Ok(Json(RetrieveResponse {
        sources,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_validation_bounds() {
        let request = RetrieveRequest {
            question: String::new(),
            sub_queries: None,
            domain_id: None,
        };
        assert!(request.validate().is_err());

        let request = RetrieveRequest {
            question: "how do I configure the ingress?".into(),
            sub_queries: Some(vec!["q1".into()]),
            domain_id: Some("prod-docs".into()),
        };
        assert!(request.validate().is_ok());
    }
}
