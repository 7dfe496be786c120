//! Data types for document records.

use serde::{Deserialize, Serialize};

/// A document row from the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    /// Filename as uploaded by the client.
    pub filename: String,
    /// Unique name the upload was stored under.
    pub stored_filename: String,
    pub file_path: String,
    pub vector_store_path: String,
    /// SHA-256 of the uploaded bytes, hex-encoded.
    pub content_hash: String,
    pub chunk_count: i64,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl Document {
    /// Upload time as RFC 3339, or empty if the timestamp is out of range.
    pub fn created_at_rfc3339(&self) -> String {
        chrono::DateTime::from_timestamp_millis(self.created_at)
            .map(|t| t.to_rfc3339())
            .unwrap_or_default()
    }
}

/// Fields for a new document row.
#[derive(Debug, Clone, Default)]
pub struct NewDocument {
    pub filename: String,
    pub stored_filename: String,
    pub file_path: String,
    pub vector_store_path: String,
    pub content_hash: String,
    pub chunk_count: usize,
    /// Defaults to the current time.
    pub created_at: Option<i64>,
}
