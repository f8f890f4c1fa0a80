use std::sync::Arc;

use crate::config::Config;
use crate::llm::{Embedder, HttpEmbedder, HttpGenerator, TextGenerator};
use crate::search::vector::VectorStore;
use crate::store::documents::DocumentStore;
use crate::store::flashcards::FlashcardStore;
use crate::store::sessions::SessionStore;
use crate::store::users::UserStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: Arc<UserStore>,
    pub documents: Arc<DocumentStore>,
    pub sessions: Arc<SessionStore>,
    pub flashcards: Arc<FlashcardStore>,
    pub vectors: Arc<VectorStore>,
    pub generator: Arc<dyn TextGenerator>,
    pub embedder: Arc<dyn Embedder>,
    pub http_client: reqwest::Client,
    pub chat_semaphore: Arc<tokio::sync::Semaphore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        std::fs::create_dir_all(config.vector_dir())?;

        let users = UserStore::open_or_create(&config.users_path())?;
        let documents = DocumentStore::open_or_create(&config.documents_path())?;
        let sessions = SessionStore::open_or_create(&config.sessions_path())?;
        let flashcards = FlashcardStore::open_or_create(&config.flashcards_path())?;
        let vectors = VectorStore::open_or_create(&config.vector_dir())?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        let max_concurrent_chats = config.max_concurrent_chats;
        let generator = HttpGenerator::new(http_client.clone(), config.llm.clone());
        let embedder = HttpEmbedder::new(http_client.clone(), config.embedding.clone());

        Ok(Self {
            config,
            users: Arc::new(users),
            documents: Arc::new(documents),
            sessions: Arc::new(sessions),
            flashcards: Arc::new(flashcards),
            vectors: Arc::new(vectors),
            generator: Arc::new(generator),
            embedder: Arc::new(embedder),
            http_client,
            chat_semaphore: Arc::new(tokio::sync::Semaphore::new(max_concurrent_chats)),
        })
    }
}
