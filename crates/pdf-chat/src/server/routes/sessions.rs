//! Session lifecycle endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::parse_session_id;
use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{SessionCreated, SessionInfo};

/// POST /api/sessions - start a session with no documents
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let session_id = state.sessions().create();
    tracing::info!("Session {} started", session_id);
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

/// GET /api/sessions/:id - summary and rendered history
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionInfo>> {
    let id = parse_session_id(&id)?;
    Ok(Json(state.sessions().get(id).await?))
}

/// DELETE /api/sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_session_id(&id)?;
    state.sessions().remove(id)?;
    tracing::info!("Session {} ended", id);
    Ok(StatusCode::NO_CONTENT)
}
