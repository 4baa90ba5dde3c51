//! Listing endpoints for stored researchers and publications

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use lattes_common::{PublicationHit, Researcher};

use crate::api::search::{require_term, AuthorQuery};
use crate::db;
use crate::{ApiResult, AppState};

/// GET /researchers
pub async fn list_researchers(State(state): State<AppState>) -> ApiResult<Json<Vec<Researcher>>> {
    Ok(Json(db::list_researchers(&state.db).await?))
}

/// GET /researchers/search?name=...
pub async fn search_researchers(
    State(state): State<AppState>,
    Query(params): Query<AuthorQuery>,
) -> ApiResult<Json<Vec<Researcher>>> {
    let term = require_term(&params.name, "name")?;
    Ok(Json(db::search_researchers(&state.db, term).await?))
}

/// GET /publications
pub async fn list_publications(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PublicationHit>>> {
    Ok(Json(db::list_publications(&state.db).await?))
}

/// Build listing routes
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/researchers", get(list_researchers))
        .route("/researchers/search", get(search_researchers))
        .route("/publications", get(list_publications))
}
