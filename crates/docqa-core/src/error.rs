//! Error types for docqa.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The uploaded document could not be parsed or has no text layer.
    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot build an index from an empty chunk sequence")]
    EmptyCorpus,

    /// Writing an index bundle to storage failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// The index exists but cannot be read back (bad JSON, wrong version, inconsistent shape).
    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    /// The answer-generation collaborator failed. Callers may retry.
    #[error("Answer service error: {0}")]
    AnswerService(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures of the answer-generation call rather than of retrieval.
    pub fn is_answer_service(&self) -> bool {
        matches!(self, Self::AnswerService(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
