//! Result assembly
//!
//! Filters the unique candidate sequence down to the documents handed to the
//! generation step. Two independent gates, both required:
//! - the relevance verdict for the candidate is `true`
//! - `similarity >= min_similarity`
//!
//! Survivors keep dedup order and are projected to `{url, title, content}`.

use runweave_common::types::{Candidate, RelevanceVerdict, SourceDocument};
use std::collections::HashMap;

/// Assemble the final source payload from graded candidates
///
/// `verdicts` may arrive in any order; they are matched to candidates by id.
/// A candidate without a verdict is excluded (it was never graded, so it never
/// passed the relevance gate).
pub fn assemble_results(
    candidates: &[Candidate],
    verdicts: &[RelevanceVerdict],
    min_similarity: f32,
) -> Vec<SourceDocument> {
    let verdict_by_id: HashMap<&str, bool> = verdicts
        .iter()
        .map(|v| (v.candidate_id.as_str(), v.is_relevant))
        .collect();

    candidates
        .iter()
        .filter(|candidate| candidate.similarity >= min_similarity)
        .filter(|candidate| {
            verdict_by_id
                .get(candidate.id.as_str())
                .copied()
                .unwrap_or(false)
        })
        .map(SourceDocument::from)
        .collect()
}
