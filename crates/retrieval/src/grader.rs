//! Relevance grading with a fail-open default
//!
//! Each unique candidate is graded against the full sub-query set (not just
//! the sub-query that retrieved it) with one completion call. Grading calls
//! fan out concurrently, one task per candidate, and are joined before the
//! pipeline proceeds.
//!
//! Failure policy: a grading call that errors or returns unparseable output
//! marks the candidate relevant. Excluding a possibly-relevant document is
//! worse than including a possibly-irrelevant one, since the generation step
//! filters again downstream. The policy lives in a named function,
//! [`RelevanceGrader::grade_with_fail_open_default`], so tests can assert on
//! it directly.

use crate::model::CompletionModel;
use futures::future::join_all;
use runweave_common::errors::{AppError, Result};
use runweave_common::types::{Candidate, RelevanceVerdict};
use runweave_common::metrics;
use serde::Deserialize;
use std::sync::Arc;

/// Grades candidates for relevance against the sub-query set
pub struct RelevanceGrader {
    model: Arc<dyn CompletionModel>,
    model_name: String,
}

#[derive(Deserialize)]
struct GradeOutput {
    score: GradeScore,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum GradeScore {
    Yes,
    No,
}

impl RelevanceGrader {
    pub fn new(model: Arc<dyn CompletionModel>, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
        }
    }

    /// Build the grading prompt for one candidate
    ///
    /// The legacy/deprecated rule is an explicit grading instruction, not an
    /// automatic one: a document graded out-of-date must score "no" even when
    /// topically related.
    pub fn build_prompt(candidate: &Candidate, sub_queries: &[String]) -> String {
        format!(
            r#"**Relevance Assessment**

You are a grader evaluating the relevance of a retrieved document to user questions.
Determine if the document contains information or insights related to at least one user question and is up-to-date.

Instructions:
1. Analyze the document's summary in relation to the user questions.
2. Determine if the document summary is related to at least one question.
3. Use a lenient evaluation approach, aiming to filter out only clearly irrelevant retrievals.
   If you think the document could be relevant to a question, you should score it as relevant.
4. Provide a binary relevance score: "yes" for relevant, "no" for irrelevant.
5. Focus solely on the document's potential usefulness in answering the questions.
6. If the document clearly indicates that it is legacy or is being deprecated, you should answer "no"

**DOCUMENT SUMMARY**
title: {}

Document summary: {}

**USER QUESTIONS**
{}

**SCORE**
Provide a 'yes' or 'no' score indicating whether the document is relevant to the questions.
Score 'no' if the document is not helpful in answering the question. Otherwise, score 'yes'.
Output the score as a JSON object with a single key 'score', e.g., {{"score": "yes"}} or {{"score": "no"}}.

**YOUR ANSWER**"#,
            candidate.title,
            candidate.summary,
            sub_queries.join("\n")
        )
    }

    /// Grade one candidate, recovering any failure with `is_relevant = true`
    ///
    /// This function never fails: grading errors are logged and counted, not
    /// surfaced.
    pub async fn grade_with_fail_open_default(
        &self,
        candidate: &Candidate,
        sub_queries: &[String],
    ) -> RelevanceVerdict {
        let is_relevant = match self.grade(candidate, sub_queries).await {
            Ok(is_relevant) => is_relevant,
            Err(e) => {
                tracing::warn!(
                    candidate_id = %candidate.id,
                    error = %e,
                    "Relevance grading failed, including candidate (fail-open)"
                );
                metrics::record_grading_fail_open();
                true
            }
        };

        RelevanceVerdict {
            candidate_id: candidate.id.clone(),
            is_relevant,
        }
    }

    /// Grade every candidate concurrently, one task per candidate
    ///
    /// Verdicts come back in candidate order. The join is unconditional:
    /// individual failures were already recovered fail-open, so there is
    /// nothing to abort on.
    #[tracing::instrument(skip_all, fields(candidate_count = candidates.len()))]
    pub async fn grade_all(
        &self,
        candidates: &[Candidate],
        sub_queries: &[String],
    ) -> Vec<RelevanceVerdict> {
        join_all(
            candidates
                .iter()
                .map(|candidate| self.grade_with_fail_open_default(candidate, sub_queries)),
        )
        .await
    }

    async fn grade(&self, candidate: &Candidate, sub_queries: &[String]) -> Result<bool> {
        let prompt = Self::build_prompt(candidate, sub_queries);
        let raw = self.model.complete(&self.model_name, None, &prompt).await?;

        let output: GradeOutput = serde_json::from_str(raw.trim()).map_err(|e| {
            AppError::MalformedModelOutput {
                message: format!("Grading output is not a {{\"score\"}} object: {}", e),
            }
        })?;

        Ok(matches!(output.score, GradeScore::Yes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScriptedModel;

    fn candidate(id: &str, title: &str) -> Candidate {
        Candidate {
            id: id.into(),
            url: format!("https://docs.example.com/{}", id),
            title: title.into(),
            summary: format!("Summary of {}", title),
            content: "content".into(),
            similarity: 0.8,
        }
    }

    fn grader(model: ScriptedModel) -> RelevanceGrader {
        RelevanceGrader::new(Arc::new(model), "test-grader")
    }

    #[tokio::test]
    async fn test_yes_verdict() {
        let grader = grader(ScriptedModel::constant(r#"{"score": "yes"}"#));
        let verdict = grader
            .grade_with_fail_open_default(&candidate("a", "Ingress Guide"), &["q".into()])
            .await;
        assert!(verdict.is_relevant);
        assert_eq!(verdict.candidate_id, "a");
    }

    #[tokio::test]
    async fn test_no_verdict() {
        let grader = grader(ScriptedModel::constant(r#"{"score": "no"}"#));
        let verdict = grader
            .grade_with_fail_open_default(&candidate("a", "Unrelated"), &["q".into()])
            .await;
        assert!(!verdict.is_relevant);
    }

    #[tokio::test]
    async fn test_fail_open_on_model_error() {
        let grader = grader(ScriptedModel::failing("model down"));
        let verdict = grader
            .grade_with_fail_open_default(&candidate("b", "Anything"), &["q".into()])
            .await;
        assert!(verdict.is_relevant);
    }

    #[tokio::test]
    async fn test_fail_open_on_non_json_output() {
        let grader = grader(ScriptedModel::constant("I think it is relevant."));
        let verdict = grader
            .grade_with_fail_open_default(&candidate("b", "Anything"), &["q".into()])
            .await;
        assert!(verdict.is_relevant);
    }

    #[tokio::test]
    async fn test_fail_open_on_unexpected_score_value() {
        let grader = grader(ScriptedModel::constant(r#"{"score": "maybe"}"#));
        let verdict = grader
            .grade_with_fail_open_default(&candidate("b", "Anything"), &["q".into()])
            .await;
        assert!(verdict.is_relevant);
    }

    #[tokio::test]
    async fn test_grade_all_preserves_candidate_order() {
        let grader = grader(ScriptedModel::new(|prompt| {
            if prompt.contains("Legacy Setup") {
                Ok(r#"{"score": "no"}"#.to_string())
            } else {
                Ok(r#"{"score": "yes"}"#.to_string())
            }
        }));

        let candidates = vec![
            candidate("a", "Current Guide"),
            candidate("b", "Legacy Setup"),
            candidate("c", "Another Guide"),
        ];
        let verdicts = grader.grade_all(&candidates, &["q".into()]).await;

        let pairs: Vec<(&str, bool)> = verdicts
            .iter()
            .map(|v| (v.candidate_id.as_str(), v.is_relevant))
            .collect();
        assert_eq!(pairs, vec![("a", true), ("b", false), ("c", true)]);
    }

    #[test]
    fn test_prompt_contains_whole_sub_query_set() {
        let prompt = RelevanceGrader::build_prompt(
            &candidate("a", "Ingress Guide"),
            &["what is X".into(), "how to configure X".into()],
        );
        assert!(prompt.contains("what is X"));
        assert!(prompt.contains("how to configure X"));
        assert!(prompt.contains("Ingress Guide"));
        assert!(prompt.contains("legacy or is being deprecated"));
    }
}
