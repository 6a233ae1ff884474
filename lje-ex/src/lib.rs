//! lje-ex library - Laser Juke Explorer service
//!
//! HTTP surface over explorer sessions: cascading filters, custom lists,
//! statistics and label export.

use axum::Router;
use chrono::{DateTime, Utc};
use lje_common::config::DataSources;
use lje_common::SessionSettings;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod batch;
pub mod error;
pub mod registry;

pub use crate::error::{ApiError, ApiResult};
pub use crate::registry::SessionRegistry;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Open sessions
    pub sessions: SessionRegistry,
    /// Data files every new session loads
    pub sources: DataSources,
    /// Filter chain and report settings for new sessions
    pub settings: SessionSettings,
    /// Service startup timestamp
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(sources: DataSources, settings: SessionSettings, idle_timeout: chrono::Duration) -> Self {
        Self {
            sessions: SessionRegistry::new(idle_timeout),
            sources,
            settings,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::session_routes())
        .merge(api::filter_routes())
        .merge(api::list_routes())
        .merge(api::report_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
