use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::llm::TextGenerator;

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// [`TextGenerator`] over an OpenAI-compatible `/v1/chat/completions`
/// API. The prompt is sent as a single user message. Non-2xx responses
/// fail with the status and body included, so the caller's fallback
/// chain can log something actionable.
pub struct HttpGenerator {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpGenerator {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    async fn generate(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        let req = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens,
            temperature,
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&req)
            .send()
            .await
            .context("Failed to call chat completions API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Chat completions API returned {status}: {body}");
        }

        let body: ChatCompletionResponse = resp
            .json()
            .await
            .context("Failed to parse chat completions response")?;

        Ok(body
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default())
    }
}
