//! Statistics and label export for the current filtered view

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use lje_common::report::StatisticsReport;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::AppState;

/// GET /api/sessions/:id/statistics
pub async fn get_statistics(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<StatisticsReport>> {
    let report = state
        .sessions
        .with_session(session_id, |session| session.statistics())
        .await?;
    Ok(Json(report))
}

/// GET /api/sessions/:id/labels
///
/// Plain-text label pages; 422 when the view is empty or too large.
pub async fn get_labels(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let document = state
        .sessions
        .with_session(session_id, |session| session.labels())
        .await??;

    tracing::info!(session_id = %session_id, pages = document.pages.len(), "labels exported");
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        document.render_text(),
    ))
}

/// Build report routes
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions/:session_id/statistics", get(get_statistics))
        .route("/api/sessions/:session_id/labels", get(get_labels))
}
