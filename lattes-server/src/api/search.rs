//! Publication search endpoints

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use lattes_common::PublicationHit;
use serde::Deserialize;

use crate::db;
use crate::{ApiError, ApiResult, AppState};

/// Query parameters for title search
#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub query: String,
}

/// Query parameters for author search
#[derive(Debug, Deserialize)]
pub struct AuthorQuery {
    pub name: String,
}

/// Reject empty or whitespace-only search terms
///
/// A non-blank term is returned as given; surrounding spaces are part of the
/// substring being matched.
pub(crate) fn require_term<'a>(term: &'a str, param: &str) -> ApiResult<&'a str> {
    if term.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("Empty search parameter '{}'", param)));
    }
    Ok(term)
}

/// GET /search?query=...
///
/// Publications whose title contains the query, case-insensitive.
pub async fn search_by_title(
    State(state): State<AppState>,
    Query(params): Query<TitleQuery>,
) -> ApiResult<Json<Vec<PublicationHit>>> {
    let term = require_term(&params.query, "query")?;
    let hits = db::search_by_title(&state.db, term).await?;
    tracing::debug!(term, results = hits.len(), "Title search");
    Ok(Json(hits))
}

/// GET /search-by-author?name=...
///
/// Publications of researchers whose name contains `name`, ordered by
/// researcher name then title.
pub async fn search_by_author(
    State(state): State<AppState>,
    Query(params): Query<AuthorQuery>,
) -> ApiResult<Json<Vec<PublicationHit>>> {
    let term = require_term(&params.name, "name")?;
    let hits = db::search_by_author(&state.db, term).await?;
    tracing::debug!(term, results = hits.len(), "Author search");
    Ok(Json(hits))
}

/// Build search routes
pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_by_title))
        .route("/search-by-author", get(search_by_author))
}
