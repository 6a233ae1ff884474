//! Session lifecycle and the filtered table view
//!
//! POST /api/sessions, DELETE /api/sessions/:id, GET /api/sessions/:id/view,
//! POST /api/sessions/:id/reload

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use lje_common::lists::LoadIssue;
use lje_common::session::{ExplorerView, ListSummary, ViewOptions};
use lje_common::ExplorerSession;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /api/sessions response
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub lists: Vec<ListSummary>,
    pub load_issues: Vec<LoadIssue>,
}

/// POST /api/sessions/:id/reload response
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub lists: Vec<ListSummary>,
    pub load_issues: Vec<LoadIssue>,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

/// POST /api/sessions
///
/// Loads the configured sources into a fresh session.
pub async fn create_session(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<CreateSessionResponse>)> {
    let sources = state.sources.clone();
    let settings = state.settings.clone();
    let session = tokio::task::spawn_blocking(move || ExplorerSession::open(sources, settings))
        .await
        .map_err(|e| ApiError::Internal(format!("Session open task failed: {}", e)))??;

    let lists = session.lists();
    let load_issues = session.load_issues().to_vec();
    let session_id = state.sessions.insert(session).await;

    tracing::info!(session_id = %session_id, lists = lists.len(), "session created");

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id,
            lists,
            load_issues,
        }),
    ))
}

/// DELETE /api/sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.sessions.remove(session_id).await {
        tracing::info!(session_id = %session_id, "session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Session {}", session_id)))
    }
}

/// GET /api/sessions/:id/view?order=date|disc&discs_only=bool
pub async fn get_view(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(options): Query<ViewOptions>,
) -> ApiResult<Json<ExplorerView>> {
    let view = state
        .sessions
        .with_session(session_id, |session| session.view(options))
        .await?;
    Ok(Json(view))
}

/// POST /api/sessions/:id/reload
pub async fn reload_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ReloadResponse>> {
    let response = state
        .sessions
        .with_session_blocking(session_id, |session| {
            session.reload().map(|()| ReloadResponse {
                lists: session.lists(),
                load_issues: session.load_issues().to_vec(),
                cache_hits: session.cache().hits(),
                cache_misses: session.cache().misses(),
            })
        })
        .await??;
    Ok(Json(response))
}

/// Build session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:session_id", delete(delete_session))
        .route("/api/sessions/:session_id/view", get(get_view))
        .route("/api/sessions/:session_id/reload", post(reload_session))
}
