//! Document record listing.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::error::{join_blocking, ApiError};
use crate::state::AppState;
use docqa_core::Error;
use docqa_store::Document;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/documents", get(list_documents))
        .route("/documents/{id}", get(get_document))
}

fn document_json(doc: &Document) -> Value {
    json!({
        "id": doc.id,
        "filename": doc.filename,
        "stored_filename": doc.stored_filename,
        "chunk_count": doc.chunk_count,
        "content_hash": doc.content_hash,
        "created_at": doc.created_at_rfc3339(),
    })
}

/// GET /documents: all records, newest first.
async fn list_documents(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let docs = join_blocking(tokio::task::spawn_blocking(move || state.store.list_documents())).await?;
    Ok(Json(json!({
        "documents": docs.iter().map(document_json).collect::<Vec<_>>(),
        "total": docs.len(),
    })))
}

/// GET /documents/{id}
async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let doc = join_blocking(tokio::task::spawn_blocking(move || {
        state
            .store
            .get_document(id)?
            .ok_or_else(|| Error::NotFound("Document not found".into()))
    }))
    .await?;
    Ok(Json(document_json(&doc)))
}
