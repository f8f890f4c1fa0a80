use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::models::{CreateFlashcardSetRequest, FlashcardSet};
use crate::state::AppState;

/// POST /api/flashcards/create: create a set explicitly.
pub async fn create_set(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<CreateFlashcardSetRequest>,
) -> Result<(StatusCode, Json<FlashcardSet>), ApiError> {
    if req.topic.trim().is_empty() {
        return Err(ApiError::Validation("Topic is required".to_string()));
    }
    if req.flashcards.is_empty() {
        return Err(ApiError::Validation(
            "At least one flashcard is required".to_string(),
        ));
    }

    let set = state.flashcards.create(
        identity.user_id,
        &req.session_id,
        req.topic.trim(),
        req.flashcards,
    )?;
    Ok((StatusCode::CREATED, Json(set)))
}

/// GET /api/flashcards/all: every set owned by the caller.
pub async fn list_all(
    State(state): State<AppState>,
    identity: Identity,
) -> Json<serde_json::Value> {
    let sets = state.flashcards.list_for_user(&identity.user_id);
    Json(serde_json::json!({ "flashcard_sets": sets }))
}

/// GET /api/flashcards/session/:id: sets generated in one session.
pub async fn list_for_session(
    State(state): State<AppState>,
    identity: Identity,
    Path(session_id): Path<String>,
) -> Json<serde_json::Value> {
    let sets = state
        .flashcards
        .list_for_session(&identity.user_id, &session_id);
    Json(serde_json::json!({ "flashcard_sets": sets }))
}

/// PUT /api/flashcards/:id/review: stamp last_reviewed.
pub async fn mark_reviewed(
    State(state): State<AppState>,
    identity: Identity,
    Path(set_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let found = state.flashcards.mark_reviewed(&set_id, &identity.user_id)?;
    if !found {
        return Err(ApiError::NotFound("Flashcard set not found".to_string()));
    }
    Ok(Json(
        serde_json::json!({ "message": "Flashcard set marked as reviewed" }),
    ))
}

/// DELETE /api/flashcards/:id
pub async fn delete_set(
    State(state): State<AppState>,
    identity: Identity,
    Path(set_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state.flashcards.delete(&set_id, &identity.user_id)?;
    if !removed {
        return Err(ApiError::NotFound("Flashcard set not found".to_string()));
    }
    Ok(Json(serde_json::json!({ "message": "Flashcard set deleted" })))
}
