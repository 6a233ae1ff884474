//! PUT /api/sessions/:id/filters/:field

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::put,
    Json, Router,
};
use lje_common::Field;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Replacement selection for one filter stage
#[derive(Debug, Deserialize)]
pub struct SetFilterRequest {
    #[serde(default)]
    pub values: Vec<String>,
}

/// Replace the remembered selection of one field
///
/// Pruning happens on the next view; values not currently offered are
/// accepted here and dropped there.
pub async fn set_filter(
    State(state): State<AppState>,
    Path((session_id, field)): Path<(Uuid, String)>,
    Json(request): Json<SetFilterRequest>,
) -> ApiResult<StatusCode> {
    let field: Field = field
        .parse()
        .map_err(|e: lje_common::Error| ApiError::BadRequest(e.to_string()))?;

    state
        .sessions
        .with_session(session_id, |session| session.set_selection(field, request.values))
        .await??;
    Ok(StatusCode::NO_CONTENT)
}

/// Build filter routes
pub fn filter_routes() -> Router<AppState> {
    Router::new().route("/api/sessions/:session_id/filters/:field", put(set_filter))
}
