//! Curriculum upload endpoint

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use crate::ingest::{ingest_batch, CurriculumFile, IngestSummary};
use crate::{ApiError, ApiResult, AppState};

/// Multipart field carrying the uploaded documents (repeated once per file)
pub const FILES_FIELD: &str = "files";

/// POST /process-xmls
///
/// Accepts a multipart form with one `files` part per curriculum document.
/// Other fields are ignored. Responds with the batch counters and the list of
/// skipped files.
pub async fn process_xmls(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<IngestSummary>> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("unnamed").to_string();
        let content = field.bytes().await.map_err(multipart_error)?;
        files.push(CurriculumFile::new(filename, content.to_vec()));
    }

    if files.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "No files uploaded (expected multipart field '{}')",
            FILES_FIELD
        )));
    }

    tracing::info!("Received {} files for processing", files.len());

    let summary = ingest_batch(&state.db, &files).await?;
    Ok(Json(summary))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(format!("Multipart error: {}", e.body_text()))
    }
}

/// Build upload routes
pub fn process_routes() -> Router<AppState> {
    Router::new().route("/process-xmls", post(process_xmls))
}
