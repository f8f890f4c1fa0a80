use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where stores and vector data are persisted
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Language model provider configuration
    pub llm: LlmConfig,
    /// Embedding provider configuration
    pub embedding: EmbeddingConfig,
    /// Web search provider configuration
    pub web_search: WebSearchConfig,
    /// Maximum concurrent chat generations
    pub max_concurrent_chats: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible chat completions API
    pub base_url: String,
    /// Model name for generation
    pub model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Request timeout in seconds (capped at 60)
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of an OpenAI-compatible embeddings API
    pub base_url: String,
    /// Model name for embeddings
    pub model: String,
    pub api_key: Option<String>,
    /// Embedding vector dimension
    pub dim: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Configuration for the web search provider. If `api_key` is None, web
/// search silently yields empty results and the pipeline answers from
/// the corpus or the model alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Request timeout in seconds (capped at 30)
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:9100".to_string(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            web_search: WebSearchConfig::default(),
            max_concurrent_chats: 3,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.jina.ai".to_string(),
            model: "jina-embeddings-v2-base-en".to_string(),
            api_key: None,
            dim: 768,
            timeout_secs: 60,
        }
    }
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tavily.com".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("DOC_CHAT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("DOC_CHAT_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(val) = std::env::var("DOC_CHAT_MAX_CONCURRENT_CHATS") {
            if let Ok(v) = val.parse() {
                config.max_concurrent_chats = v;
            }
        }

        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            config.llm.model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("LLM_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.llm.timeout_secs = v.min(60); // Cap at 60s
            }
        }

        if let Ok(url) = std::env::var("EMBEDDING_BASE_URL") {
            config.embedding.base_url = url;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }
        if let Ok(key) = std::env::var("EMBEDDING_API_KEY") {
            config.embedding.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.embedding.dim = d;
            }
        }
        if let Ok(val) = std::env::var("EMBEDDING_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.embedding.timeout_secs = v.min(120);
            }
        }

        if let Ok(url) = std::env::var("WEB_SEARCH_BASE_URL") {
            config.web_search.base_url = url;
        }
        if let Ok(key) = std::env::var("WEB_SEARCH_API_KEY") {
            config.web_search.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("WEB_SEARCH_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.web_search.timeout_secs = v.min(30);
            }
        }

        config
    }

    pub fn vector_dir(&self) -> PathBuf {
        self.data_dir.join("vectors")
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    pub fn documents_path(&self) -> PathBuf {
        self.data_dir.join("documents.json")
    }

    pub fn sessions_path(&self) -> PathBuf {
        self.data_dir.join("sessions.json")
    }

    pub fn flashcards_path(&self) -> PathBuf {
        self.data_dir.join("flashcards.json")
    }
}
