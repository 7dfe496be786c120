//! PDF upload and ingestion.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tracing::info;

use crate::error::{join_blocking, ApiError};
use crate::state::AppState;
use docqa_ingest::{FileType, Ingester};

/// Upload size cap.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload-pdf", post(upload_pdf))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// POST /upload-pdf: store, extract, chunk and index a PDF.
async fn upload_pdf(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) =
        upload.ok_or_else(|| ApiError::bad_request("Missing multipart field 'file'"))?;
    if FileType::from_filename(&filename) != FileType::Pdf {
        return Err(ApiError::bad_request("Only PDF files are allowed"));
    }
    info!("Received upload {} ({} bytes)", filename, bytes.len());

    let st = state.clone();
    let outcome = join_blocking(tokio::task::spawn_blocking(move || {
        Ingester::new(&st.store, &st.config.data_paths, &st.config.chunking)?
            .ingest_pdf(&filename, &bytes)
    }))
    .await?;

    Ok(Json(json!({
        "message": "PDF uploaded successfully",
        "document_id": outcome.document_id,
        "chunks": outcome.chunk_count,
    })))
}
