//! Completion model abstraction
//!
//! One seam for both generative call sites in the pipeline: query expansion
//! (structured question list) and relevance grading (yes/no score). The HTTP
//! implementation speaks the OpenAI `/chat/completions` wire shape; the
//! scripted implementation drives tests without a network.

use async_trait::async_trait;
use runweave_common::config::ModelConfig;
use runweave_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Trait for single-turn completion calls
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Run one completion and return the raw assistant text
    async fn complete(&self, model: &str, system: Option<&str>, prompt: &str) -> Result<String>;
}

/// HTTP completion client for OpenAI-compatible endpoints
pub struct OpenAICompatibleModel {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAICompatibleModel {
    /// Create a new completion client from configuration
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config
                .api_base
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
        })
    }
}

#[async_trait]
impl CompletionModel for OpenAICompatibleModel {
    async fn complete(&self, model: &str, system: Option<&str>, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest { model, messages };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ModelError {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: ChatResponse = response.json().await.map_err(|e| AppError::ModelError {
            message: format!("Failed to parse response: {}", e),
        })?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::ModelError {
                message: "Empty completion response".to_string(),
            })
    }
}

/// Scripted completion model for tests
///
/// Answers from a responder closure keyed on the prompt text, so concurrent
/// call sites get stable answers regardless of scheduling order.
pub struct ScriptedModel {
    responder: Box<dyn Fn(&str) -> std::result::Result<String, String> + Send + Sync>,
}

impl ScriptedModel {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<String, String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
        }
    }

    /// A model that returns the same text for every prompt
    pub fn constant(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Ok(text.clone()))
    }

    /// A model that fails every call
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move |_| Err(message.clone()))
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, _model: &str, _system: Option<&str>, prompt: &str) -> Result<String> {
        (self.responder)(prompt).map_err(|message| AppError::ModelError { message })
    }
}
