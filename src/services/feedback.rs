// src/services/feedback.rs

//! AI-written feedback for a finished test.
//!
//! Feedback is best effort. Whatever goes wrong with the provider, the caller
//! gets `FALLBACK_FEEDBACK` and the submission goes ahead.

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{config::Config, models::category::Category, services::scoring::Scorecard};

pub const FALLBACK_FEEDBACK: &str =
    "Good effort! Review the questions you missed and keep practicing to improve your speed and accuracy.";

/// Failure of the text-generation provider. Never surfaces to clients.
#[derive(Debug)]
pub struct ProviderError(pub String);

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feedback provider error: {}", self.0)
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError(err.to_string())
    }
}

#[async_trait]
pub trait FeedbackProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// OpenAI-compatible chat-completions client.
#[derive(Clone)]
pub struct ChatCompletionProvider {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionProvider {
    pub fn new(client: Client, api_url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
            model,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Strictly parses a chat-completions body into the first message's text.
pub fn parse_completion(body: &str) -> Result<String, ProviderError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError(format!("malformed response: {}", e)))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ProviderError("response has no content".to_string()))
}

#[async_trait]
impl FeedbackProvider for ChatCompletionProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are an encouraging placement-preparation coach. Reply with 3-4 sentences of plain text."
                },
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.7
        });

        let body = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_completion(&body)
    }
}

/// Used when no API key is configured. Always fails, so the fallback text is used.
pub struct DisabledProvider;

#[async_trait]
impl FeedbackProvider for DisabledProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError("no AI_API_KEY configured".to_string()))
    }
}

/// Picks the provider for the given configuration.
pub fn provider_from_config(config: &Config) -> Arc<dyn FeedbackProvider> {
    match &config.ai_api_key {
        Some(key) => Arc::new(ChatCompletionProvider::new(
            Client::new(),
            config.ai_api_url.clone(),
            key.clone(),
            config.ai_model.clone(),
        )),
        None => {
            tracing::warn!("AI_API_KEY not set, test feedback will use the fallback text");
            Arc::new(DisabledProvider)
        }
    }
}

/// What the prompt is built from.
pub struct FeedbackContext<'a> {
    pub topic_name: &'a str,
    pub category: Category,
    pub scorecard: &'a Scorecard,
    pub time_taken: i32,
}

pub fn build_prompt(ctx: &FeedbackContext<'_>) -> String {
    let card = ctx.scorecard;
    let b = &card.breakdown;
    format!(
        "A student finished a {category} aptitude test on \"{topic}\".\n\
         Score: {correct}/{total} ({accuracy:.1}% accuracy).\n\
         Time taken: {time} seconds ({avg:.1} seconds per question).\n\
         By difficulty: easy {ec}/{et}, medium {mc}/{mt}, hard {hc}/{ht}.\n\
         Give short, specific feedback: one strength, one weakness and one concrete next step.",
        category = ctx.category,
        topic = ctx.topic_name,
        correct = card.correct_answers,
        total = card.total_questions,
        accuracy = card.accuracy(),
        time = ctx.time_taken,
        avg = card.average_time_per_question(ctx.time_taken),
        ec = b.easy.correct,
        et = b.easy.total,
        mc = b.medium.correct,
        mt = b.medium.total,
        hc = b.hard.correct,
        ht = b.hard.total,
    )
}

/// Asks the provider for feedback, bounded by `timeout`.
/// Errors and timeouts are logged and replaced by `FALLBACK_FEEDBACK`.
pub async fn generate_feedback(
    provider: &dyn FeedbackProvider,
    prompt: &str,
    timeout: Duration,
) -> String {
    match tokio::time::timeout(timeout, provider.complete(prompt)).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            tracing::warn!("Feedback generation failed: {}", e);
            FALLBACK_FEEDBACK.to_string()
        }
        Err(_) => {
            tracing::warn!("Feedback generation timed out after {:?}", timeout);
            FALLBACK_FEEDBACK.to_string()
        }
    }
}
