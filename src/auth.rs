//! Authenticated identity extraction.
//!
//! Credential issuance lives outside this service; requests carry an
//! opaque bearer token that resolves to a user and their default
//! retrieval namespace.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller: user id plus their default namespace.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub namespace: String,
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Expected bearer token".to_string()))?;

        let user = state
            .users
            .find_by_token(token)
            .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

        Ok(Identity {
            user_id: user.id,
            namespace: user.namespace,
        })
    }
}
