//! Service status.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::error::{join_blocking, ApiError};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(get_status))
}

/// GET /status
async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let st = state.clone();
    let documents =
        join_blocking(tokio::task::spawn_blocking(move || st.store.count_documents())).await?;
    let answer = state.answer.as_ref();
    Ok(Json(json!({
        "status": "healthy",
        "service": "docqa",
        "documents": documents,
        "llmAvailable": answer.is_some(),
        "llmProvider": answer.map(|a| a.provider.to_string()),
        "model": answer.map(|a| a.model.clone()),
        "chunkSize": state.config.chunking.chunk_size,
        "chunkOverlap": state.config.chunking.chunk_overlap,
        "topK": state.config.top_k,
    })))
}
