//! Mapping of domain errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use docqa_core::Error;

/// Error returned by route handlers. Rendered as `{"detail": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    Core(Error),
    BadRequest(String),
    /// No LLM provider has an API key.
    NoProvider,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NoProvider => StatusCode::SERVICE_UNAVAILABLE,
            Self::Core(e) => match e {
                Error::Extraction(_) | Error::EmptyCorpus => StatusCode::UNPROCESSABLE_ENTITY,
                Error::InvalidConfig(_) => StatusCode::BAD_REQUEST,
                Error::NotFound(_) | Error::IndexNotFound(_) => StatusCode::NOT_FOUND,
                Error::AnswerService(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::BadRequest(msg) => msg.clone(),
            Self::NoProvider => "No LLM provider configured".into(),
            Self::Core(Error::NotFound(what)) => what.clone(),
            Self::Core(Error::AnswerService(msg)) => format!("Error generating answer: {}", msg),
            Self::Core(e) => e.to_string(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self::Core(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();
        if status.is_server_error() {
            error!("{} {}", status, detail);
        } else {
            warn!("{} {}", status, detail);
        }
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Await a blocking-task result, flattening the join error.
pub async fn join_blocking<T>(
    handle: tokio::task::JoinHandle<docqa_core::Result<T>>,
) -> Result<T, ApiError> {
    handle
        .await
        .map_err(|e| ApiError::Core(Error::Internal(format!("blocking task failed: {}", e))))?
        .map_err(ApiError::from)
}
