//! HTTP API handlers for lje-ex

pub mod filters;
pub mod health;
pub mod lists;
pub mod reports;
pub mod sessions;

pub use filters::filter_routes;
pub use health::health_routes;
pub use lists::list_routes;
pub use reports::report_routes;
pub use sessions::session_routes;
