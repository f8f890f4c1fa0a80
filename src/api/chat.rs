use axum::extract::State;
use axum::Json;

use crate::auth::Identity;
use crate::chat::orchestrator;
use crate::error::ApiError;
use crate::models::{QueryRequest, QueryResponse};
use crate::state::AppState;

/// POST /api/chat/query: answer a query through the full pipeline.
pub async fn query(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    // Bound concurrent generations; the permit is held for the whole cycle
    let _permit = state
        .chat_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| ApiError::Provider("Chat service at capacity".to_string()))?;

    let response = orchestrator::answer_query(&state, &identity, &req).await?;
    Ok(Json(response))
}
