//! Query expansion
//!
//! Turns one free-text question into at most [`MAX_SUB_QUERIES`] related
//! sub-queries used to diversify retrieval. One call to the completion model,
//! constrained to a typed JSON list; malformed output is an error that
//! propagates to the caller. There is no local recovery here: a retrieval
//! round without usable sub-queries is a failed retrieval round.

use crate::model::CompletionModel;
use runweave_common::errors::{AppError, Result};
use serde::Deserialize;
use std::sync::Arc;

/// Upper bound on sub-queries per expansion, for any input
pub const MAX_SUB_QUERIES: usize = 3;

const SYSTEM_PROMPT: &str =
    "You are a query understanding assistant. Analyze the user query and generate similar questions.";

/// Expands a user question into retrieval sub-queries
pub struct QueryExpander {
    model: Arc<dyn CompletionModel>,
    model_name: String,
}

#[derive(Deserialize)]
struct ExpansionOutput {
    questions: Vec<String>,
}

impl QueryExpander {
    pub fn new(model: Arc<dyn CompletionModel>, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
        }
    }

    /// Expand one query into up to 3 concise sub-queries
    #[tracing::instrument(skip(self), fields(model = %self.model_name))]
    pub async fn expand(&self, query: &str) -> Result<Vec<String>> {
        let prompt = format!(
            "Analyze this query: \"{}\". Provide the following:\n\
             {} similar questions that could help answer the user's query. Be concise.\n\
             Respond with a JSON object of the shape {{\"questions\": [\"...\"]}} and nothing else.",
            query, MAX_SUB_QUERIES
        );

        let raw = self
            .model
            .complete(&self.model_name, Some(SYSTEM_PROMPT), &prompt)
            .await?;

        let output: ExpansionOutput =
            serde_json::from_str(strip_code_fences(&raw)).map_err(|e| {
                AppError::MalformedModelOutput {
                    message: format!("Query expansion output is not a question list: {}", e),
                }
            })?;

        let mut questions: Vec<String> = output
            .questions
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();
        questions.truncate(MAX_SUB_QUERIES);

        tracing::debug!(count = questions.len(), "Expanded query into sub-queries");
        Ok(questions)
    }
}

/// Strip a leading/trailing markdown code fence if the model added one
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScriptedModel;

    fn expander(model: ScriptedModel) -> QueryExpander {
        QueryExpander::new(Arc::new(model), "test-model")
    }

    #[tokio::test]
    async fn test_expand_parses_question_list() {
        let expander = expander(ScriptedModel::constant(
            r#"{"questions": ["what is X", "how to configure X", "X prerequisites"]}"#,
        ));
        let questions = expander.expand("tell me about X").await.unwrap();
        assert_eq!(
            questions,
            vec!["what is X", "how to configure X", "X prerequisites"]
        );
    }

    #[tokio::test]
    async fn test_expand_never_exceeds_bound() {
        let expander = expander(ScriptedModel::constant(
            r#"{"questions": ["a", "b", "c", "d", "e"]}"#,
        ));
        let questions = expander.expand("anything").await.unwrap();
        assert_eq!(questions.len(), MAX_SUB_QUERIES);
        assert_eq!(questions, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_expand_tolerates_code_fences() {
        let expander = expander(ScriptedModel::constant(
            "```json\n{\"questions\": [\"only one\"]}\n```",
        ));
        let questions = expander.expand("q").await.unwrap();
        assert_eq!(questions, vec!["only one"]);
    }

    #[tokio::test]
    async fn test_malformed_output_propagates() {
        let expander = expander(ScriptedModel::constant("here are some questions: 1. ..."));
        let err = expander.expand("q").await.unwrap_err();
        assert!(matches!(err, AppError::MalformedModelOutput { .. }));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let expander = expander(ScriptedModel::failing("upstream down"));
        let err = expander.expand("q").await.unwrap_err();
        assert!(matches!(err, AppError::ModelError { .. }));
    }

    #[tokio::test]
    async fn test_empty_questions_are_dropped() {
        let expander = expander(ScriptedModel::constant(
            r#"{"questions": ["  ", "real question"]}"#,
        ));
        let questions = expander.expand("q").await.unwrap();
        assert_eq!(questions, vec!["real question"]);
    }
}
