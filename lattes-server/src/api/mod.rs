//! HTTP API handlers for lattes-server

pub mod catalog;
pub mod health;
pub mod process;
pub mod search;
pub mod ui;

pub use catalog::catalog_routes;
pub use health::health_routes;
pub use process::process_routes;
pub use search::search_routes;
pub use ui::ui_routes;

use crate::ApiError;
use axum::http::Uri;

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
