//! Candidate deduplication
//!
//! Merges per-sub-query result lists into a unique candidate set keyed by
//! candidate `id`. Stable first-seen semantics: when the same document comes
//! back for several sub-queries, the occurrence from the earliest sub-query
//! wins and later duplicates are discarded. Scores are never merged or
//! averaged; first-seen ordering reflects sub-query priority, not best-score
//! selection.

use runweave_common::types::Candidate;
use std::collections::HashSet;

/// Deduplicate candidates by `id`, keeping first occurrences in order
pub fn dedup_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, similarity: f32) -> Candidate {
        Candidate {
            id: id.into(),
            url: format!("https://docs.example.com/{}", id),
            title: format!("Doc {}", id),
            summary: "summary".into(),
            content: "content".into(),
            similarity,
        }
    }

    #[test]
    fn test_first_seen_wins() {
        // Sub-query 1: [a (0.9), b (0.2)]; sub-query 2: [a (0.5), c (0.4)]
        let merged = vec![
            candidate("a", 0.9),
            candidate("b", 0.2),
            candidate("a", 0.5),
            candidate("c", 0.4),
        ];

        let unique = dedup_candidates(merged);

        let ids: Vec<&str> = unique.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        // The surviving `a` is the one from the first sub-query
        assert!((unique[0].similarity - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_idempotence() {
        let merged = vec![
            candidate("a", 0.9),
            candidate("b", 0.2),
            candidate("a", 0.5),
            candidate("b", 0.1),
            candidate("c", 0.4),
        ];

        let once = dedup_candidates(merged);
        let twice = dedup_candidates(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        assert!(dedup_candidates(Vec::new()).is_empty());
    }

    #[test]
    fn test_no_duplicates_passes_through() {
        let merged = vec![candidate("a", 0.9), candidate("b", 0.8)];
        let unique = dedup_candidates(merged.clone());
        assert_eq!(unique, merged);
    }
}
