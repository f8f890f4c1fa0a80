use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Chat interaction mode. Unknown tags fall back to `Casual`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Study,
    Research,
    Casual,
}

impl SessionMode {
    /// Lossy parse from a request tag. Anything unrecognized is `Casual`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "study" => SessionMode::Study,
            "research" => SessionMode::Research,
            _ => SessionMode::Casual,
        }
    }

    /// Web augmentation is enabled for casual and research, never for study.
    pub fn allows_web_search(self) -> bool {
        !matches!(self, SessionMode::Study)
    }
}

impl Default for SessionMode {
    fn default() -> Self {
        SessionMode::Casual
    }
}

/// Query request
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub session_id: Option<String>,
    /// Restrict retrieval to one isolated collection namespace
    pub collection_namespace: Option<String>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub mode: Option<String>,
}

fn default_top_k() -> usize {
    15
}

/// Query response
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub session_id: String,
}

/// A deduplicated source reference returned alongside an answer.
/// Uniqueness within one answer is keyed by (document, page).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    pub document: String,
    pub page: Option<u32>,
    pub score: f32,
    pub text_snippet: String,
}

/// A vector search hit scoped to one namespace. Transient: produced per
/// query, never persisted.
#[derive(Debug, Clone)]
pub struct RetrievedMatch {
    pub namespace: String,
    pub score: f32,
    pub document: String,
    pub page: Option<u32>,
    pub text: String,
}

/// A single chat turn (user or assistant)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A persisted conversation with a fixed 30-day TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: String,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
}

/// One question/answer pair inside a flashcard set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

/// A persisted set of flashcards generated in study mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashcardSet {
    pub set_id: String,
    pub user_id: Uuid,
    pub session_id: String,
    pub topic: String,
    pub flashcards: Vec<Flashcard>,
    pub created_at: DateTime<Utc>,
    pub last_reviewed: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// A tracked uploaded document. Ingestion (extraction, chunking,
/// embedding, upsertion) happens outside this service; retrieval only
/// cares about completed documents and their namespaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub namespace: String,
    pub processing_status: ProcessingStatus,
    pub chunk_count: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// A registered user. Token issuance is out of scope; tokens are opaque
/// lookup keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub token: String,
    pub namespace: String,
}

impl User {
    /// Default retrieval namespace derived from the user id.
    pub fn default_namespace(id: &Uuid) -> String {
        format!("user_{id}")
    }

    /// Namespace of an isolated sub-collection owned by this user.
    pub fn collection_namespace(&self, collection: &str) -> String {
        format!("{}__{collection}", self.namespace)
    }
}

/// Create-flashcard-set request (manual creation via the API)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFlashcardSetRequest {
    pub session_id: String,
    pub topic: String,
    pub flashcards: Vec<Flashcard>,
}

/// Session summary returned by the list endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
}
