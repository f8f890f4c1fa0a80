use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::auth::Identity;
use crate::chat::prompt;
use crate::error::ApiError;
use crate::models::SessionSummary;
use crate::state::AppState;

const SESSION_LIST_LIMIT: usize = 50;

/// GET /api/chat/sessions: list the caller's sessions, newest first.
/// Sessions with messages but no title get one generated lazily;
/// title generation is best-effort and falls back to "New Chat".
pub async fn list_sessions(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sessions = state
        .sessions
        .list_for_user(&identity.user_id, SESSION_LIST_LIMIT);

    let mut summaries = Vec::with_capacity(sessions.len());
    for session in sessions {
        let title = match &session.title {
            Some(title) => title.clone(),
            None if !session.messages.is_empty() => {
                let first = &session.messages[0].content;
                match state
                    .generator
                    .generate(&prompt::title_prompt(first), prompt::MAX_TOKENS_TITLE, 0.3)
                    .await
                {
                    Ok(raw) => {
                        let title = raw.trim().trim_matches(['"', '\'']).to_string();
                        if let Err(e) = state.sessions.set_title(&session.session_id, &title) {
                            tracing::warn!("Failed to persist session title: {e:#}");
                        }
                        title
                    }
                    Err(e) => {
                        tracing::warn!("Title generation failed: {e:#}");
                        "New Chat".to_string()
                    }
                }
            }
            None => "New Chat".to_string(),
        };

        summaries.push(SessionSummary {
            session_id: session.session_id,
            title,
            created_at: session.created_at,
            message_count: session.messages.len(),
        });
    }

    Ok(Json(serde_json::json!({ "sessions": summaries })))
}

/// GET /api/chat/sessions/:id: full transcript of one session.
pub async fn get_session(
    State(state): State<AppState>,
    identity: Identity,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state
        .sessions
        .get(&session_id, &identity.user_id)
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    Ok(Json(serde_json::json!({
        "session_id": session.session_id,
        "title": session.title.unwrap_or_else(|| "Chat".to_string()),
        "created_at": session.created_at,
        "messages": session.messages,
    })))
}

/// POST /api/chat/sessions/new: create an empty session.
pub async fn create_session(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let session = state.sessions.create(identity.user_id)?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "session_id": session.session_id,
            "created_at": session.created_at,
        })),
    ))
}

/// DELETE /api/chat/sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    identity: Identity,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state.sessions.delete(&session_id, &identity.user_id)?;
    if !removed {
        return Err(ApiError::NotFound("Session not found".to_string()));
    }
    Ok(Json(serde_json::json!({ "message": "Session deleted" })))
}
