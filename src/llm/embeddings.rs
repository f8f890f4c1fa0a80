use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingConfig;
use crate::llm::Embedder;

/// Maximum characters to send per text to the embedding API. Dense
/// content can tokenize at well over 2 tokens per 3 chars, so this keeps
/// each input safely inside an 8k-token context.
const MAX_EMBED_CHARS: usize = 3_000;

/// Texts per request. The provider accepts larger batches but keeping
/// requests small bounds the cost of one retried failure.
const BATCH_SIZE: usize = 64;

/// Retry budget for embedding requests: 3 attempts, 1s/2s/4s backoff.
const MAX_ATTEMPTS: u32 = 3;

/// Truncate `text` to at most `MAX_EMBED_CHARS`, splitting on a UTF-8 char boundary.
fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_CHARS {
        return text;
    }
    let mut end = MAX_EMBED_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

/// [`Embedder`] over an OpenAI-compatible `/v1/embeddings` API, with
/// char-boundary truncation, batching, and retry with backoff.
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: EmbeddingConfig,
}

impl HttpEmbedder {
    pub fn new(client: reqwest::Client, config: EmbeddingConfig) -> Self {
        Self { client, config }
    }

    /// Generate embeddings for a batch of texts, order-preserving. Used
    /// by the ingestion collaborator when upserting chunk vectors.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let truncated: Vec<String> = texts
            .iter()
            .map(|t| truncate_for_embedding(t).to_string())
            .collect();

        let mut all_embeddings = Vec::with_capacity(truncated.len());
        for chunk in truncated.chunks(BATCH_SIZE) {
            let embeddings = self.embed_chunk_with_retry(chunk).await?;
            all_embeddings.extend(embeddings);
        }
        Ok(all_embeddings)
    }

    async fn embed_chunk_with_retry(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut last_err = None;
        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let wait = Duration::from_secs(1 << (attempt - 1)); // 1s, 2s, 4s
                tracing::warn!(
                    "Embedding request failed, retrying in {}s (attempt {}/{MAX_ATTEMPTS})",
                    wait.as_secs(),
                    attempt + 1
                );
                tokio::time::sleep(wait).await;
            }
            match self.embed_chunk(chunk).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("embedding request failed")))
    }

    async fn embed_chunk(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embeddings", self.config.base_url);
        let api_key = self.config.api_key.as_deref().unwrap_or_default();

        let req = EmbedRequest {
            model: self.config.model.clone(),
            input: chunk.to_vec(),
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&req)
            .send()
            .await
            .context("Failed to call embeddings API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Embeddings API returned {status}: {body}");
        }

        let body: EmbedResponse = resp
            .json()
            .await
            .context("Failed to parse embeddings response")?;

        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results.into_iter().next().context("No embedding returned")
    }
}
