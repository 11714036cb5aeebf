use crate::handlers::auth::current_profile;
use crate::handlers::error::ApiError;
use crate::middleware::auth::auth_middleware;
use crate::models::auth::Claims;
use crate::models::history::SavedIdea;
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    response::Json,
    routing::{delete, get, Router},
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn history_routes() -> Router {
    Router::new()
        .route("/api/history", get(list_history).put(save_history))
        .route("/api/history/:id", delete(delete_history))
        .layer(axum::middleware::from_fn(auth_middleware))
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub history: Vec<SavedIdea>,
}

/// The caller's 50 most recently saved ideas, newest first.
pub async fn list_history(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let profile = current_profile(&state, &claims).await?;
    let history = state.history.list_by_user(profile.id).await?;
    Ok(Json(HistoryResponse { success: true, history }))
}

/// Insert or replace an entry, keyed by the idea id.
pub async fn save_history(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(entry): Json<SavedIdea>,
) -> Result<Json<Value>, ApiError> {
    if entry.id().trim().is_empty() {
        return Err(ApiError::bad_request("History entry needs an id"));
    }
    let profile = current_profile(&state, &claims).await?;
    state.history.upsert(profile.id, &entry).await?;
    tracing::debug!("Saved history entry {} for {}", entry.id(), profile.email);

    Ok(Json(json!({ "success": true, "id": entry.id() })))
}

pub async fn delete_history(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::bad_request("History entry id is required"));
    }
    let profile = current_profile(&state, &claims).await?;
    let deleted = state.history.delete(profile.id, &id).await?;

    Ok(Json(json!({ "success": true, "deleted": deleted })))
}
