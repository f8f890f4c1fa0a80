//! Adapters for the hosted language-model and embedding providers.
//!
//! Both speak OpenAI-compatible HTTP APIs. The [`TextGenerator`] and
//! [`Embedder`] traits are the seams the pipeline depends on; the HTTP
//! implementations below them are the defaults. Generation calls are
//! never retried; embedding calls retry with exponential backoff because
//! they sit on the critical path of retrieval.

use anyhow::Result;
use async_trait::async_trait;

pub mod embeddings;
pub mod generate;

pub use embeddings::HttpEmbedder;
pub use generate::HttpGenerator;

/// Text generation against the configured model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String>;
}

/// Single-text embedding (the query path).
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
