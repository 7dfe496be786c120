//! Question answering over one uploaded document.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{join_blocking, ApiError};
use crate::state::AppState;
use docqa_chat::build_context;
use docqa_core::Error;
use docqa_index::Retriever;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ask-question", get(ask_question))
}

#[derive(Debug, Deserialize)]
struct AskQuery {
    question: String,
    document_id: i64,
}

/// GET /ask-question?question=..&document_id=..
async fn ask_question(
    State(state): State<Arc<AppState>>,
    Query(AskQuery {
        question,
        document_id,
    }): Query<AskQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let st = state.clone();
    let query = question.clone();
    let passages = join_blocking(tokio::task::spawn_blocking(move || {
        let doc = st
            .store
            .get_document(document_id)?
            .ok_or_else(|| Error::NotFound("Document not found".into()))?;
        Retriever::search(&doc.vector_store_path, &query, st.config.top_k)
    }))
    .await?;
    debug!(
        "Document {}: {} passages for question",
        document_id,
        passages.len()
    );

    let backend = state.answer.as_ref().ok_or(ApiError::NoProvider)?;
    let context = build_context(&passages);
    let answer = backend.service.answer(&question, &context).await?;

    Ok(Json(json!({ "answer": answer })))
}
