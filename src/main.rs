use axum::routing::{delete, get, post, put};
use axum::Router;
use tracing_subscriber::EnvFilter;

use doc_chat::api;
use doc_chat::config::Config;
use doc_chat::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!(
        "LLM: {} ({}), embeddings: {} ({})",
        config.llm.model,
        config.llm.base_url,
        config.embedding.model,
        config.embedding.base_url
    );
    if config.web_search.api_key.is_none() {
        tracing::info!("Web search not configured; queries will use corpus and model only");
    }

    let state = AppState::new(config.clone())?;

    let app = Router::new()
        .route("/api/chat/query", post(api::chat::query))
        .route("/api/chat/sessions", get(api::sessions::list_sessions))
        .route("/api/chat/sessions/new", post(api::sessions::create_session))
        .route("/api/chat/sessions/{id}", get(api::sessions::get_session))
        .route(
            "/api/chat/sessions/{id}",
            delete(api::sessions::delete_session),
        )
        .route("/api/flashcards/create", post(api::flashcards::create_set))
        .route("/api/flashcards/all", get(api::flashcards::list_all))
        .route(
            "/api/flashcards/session/{id}",
            get(api::flashcards::list_for_session),
        )
        .route(
            "/api/flashcards/{id}/review",
            put(api::flashcards::mark_reviewed),
        )
        .route("/api/flashcards/{id}", delete(api::flashcards::delete_set))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
