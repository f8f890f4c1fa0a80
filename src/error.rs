use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Error taxonomy surfaced at the HTTP boundary.
///
/// Provider failures inside the answer pipeline are not raised through
/// this type directly; they degrade through the fallback chain in the
/// orchestrator and only become `Internal` once every tier has failed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Validation(String),

    /// An external backend (embedding, vector store, LLM, web search)
    /// failed after all fallbacks were exhausted.
    #[error("provider error: {0}")]
    Provider(String),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Provider(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal details stay in the logs, not the response body
        let message = match &self {
            ApiError::Internal(e) => {
                tracing::error!("internal error: {e:#}");
                "internal server error".to_string()
            }
            ApiError::Provider(e) => {
                tracing::error!("provider error: {e}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "detail": message }))).into_response()
    }
}
