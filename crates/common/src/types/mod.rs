//! Core retrieval types shared across services
//!
//! Candidates are immutable once produced by a knowledge-store search: the
//! pipeline only filters and annotates them, never mutates them in place.

use serde::{Deserialize, Serialize};

/// A knowledge-store entry returned by a similarity search,
/// pre-relevance-filtering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    /// Content-addressable identifier, unique within the knowledge store
    pub id: String,

    /// Source URL, used downstream for citations
    pub url: String,

    /// Document title
    pub title: String,

    /// Short summary used for relevance grading
    pub summary: String,

    /// Full parsed text
    pub content: String,

    /// Similarity score in [0, 1], higher is closer
    pub similarity: f32,
}

/// Binary relevance verdict for one candidate, against the sub-query set as a
/// whole. Produced once per unique candidate per grading round; not persisted
/// beyond the current request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelevanceVerdict {
    pub candidate_id: String,
    pub is_relevant: bool,
}

/// The projection of a relevant candidate handed to the generation step.
///
/// This is the only payload the generation step sees: internal scores,
/// summaries, and store identifiers are deliberately dropped so nothing
/// irrelevant to citation needs can leak.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDocument {
    pub url: String,
    pub title: String,
    pub content: String,
}

impl From<&Candidate> for SourceDocument {
    fn from(candidate: &Candidate) -> Self {
        Self {
            url: candidate.url.clone(),
            title: candidate.title.clone(),
            content: candidate.content.clone(),
        }
    }
}
