//! Custom list endpoints: pick, restrict, paste, edit, save

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use lje_common::lists::PasteReport;
use lje_common::session::{EditEvent, EditOutcome, ListSummary};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListNamesRequest {
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasteRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct EditsRequest {
    pub edits: Vec<EditEvent>,
}

#[derive(Debug, Serialize)]
pub struct EditsResponse {
    pub outcomes: Vec<EditOutcome>,
}

#[derive(Debug, Serialize)]
pub struct SaveListResponse {
    pub name: String,
    pub path: PathBuf,
}

/// GET /api/sessions/:id/lists
pub async fn get_lists(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<Vec<ListSummary>>> {
    let lists = state
        .sessions
        .with_session(session_id, |session| session.lists())
        .await?;
    Ok(Json(lists))
}

/// PUT /api/sessions/:id/lists/attached
pub async fn set_attached(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ListNamesRequest>,
) -> ApiResult<StatusCode> {
    state
        .sessions
        .with_session(session_id, |session| session.set_attached_lists(request.names))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/sessions/:id/lists/restriction
pub async fn set_restriction(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ListNamesRequest>,
) -> ApiResult<StatusCode> {
    state
        .sessions
        .with_session(session_id, |session| session.set_restriction(request.names))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/sessions/:id/lists/:name/save
pub async fn save_list(
    State(state): State<AppState>,
    Path((session_id, name)): Path<(Uuid, String)>,
) -> ApiResult<Json<SaveListResponse>> {
    let list = name.clone();
    let path = state
        .sessions
        .with_session_blocking(session_id, move |session| session.save_list(&list))
        .await??;
    Ok(Json(SaveListResponse { name, path }))
}

/// PUT /api/sessions/:id/custom
pub async fn paste_custom(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<PasteRequest>,
) -> ApiResult<Json<PasteReport>> {
    let report = state
        .sessions
        .with_session(session_id, |session| session.paste_custom(&request.text))
        .await?;
    Ok(Json(report))
}

/// POST /api/sessions/:id/edits
///
/// Edits for references outside the current filtered view come back stale.
pub async fn apply_edits(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<EditsRequest>,
) -> ApiResult<Json<EditsResponse>> {
    let outcomes = state
        .sessions
        .with_session(session_id, |session| session.apply_edits(request.edits))
        .await?;
    Ok(Json(EditsResponse { outcomes }))
}

/// Build list routes
pub fn list_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions/:session_id/lists", get(get_lists))
        .route("/api/sessions/:session_id/lists/attached", put(set_attached))
        .route("/api/sessions/:session_id/lists/restriction", put(set_restriction))
        .route("/api/sessions/:session_id/lists/:name/save", post(save_list))
        .route("/api/sessions/:session_id/custom", put(paste_custom))
        .route("/api/sessions/:session_id/edits", post(apply_edits))
}
