//! SQLite-backed document metadata store.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::schema::SCHEMA_SQL;
use crate::types::*;
use docqa_core::{Error, Result};

/// Document metadata store. The connection is shared behind a mutex.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create the store.
    ///
    /// `db_dir` is the directory (e.g., `data/db/`). The file will be `db_dir/docqa.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir)?;
        let db_path = db_dir.join("docqa.db");

        let conn = Self::create_connection(&db_path)?;
        Self::init_schema(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        info!(
            "SqliteStore initialized: {} documents, path={}",
            store.count_documents()?,
            store.db_path.display()
        );
        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Insert a document. Returns the new document ID.
    pub fn add_document(&self, doc: &NewDocument) -> Result<i64> {
        let created_at = doc
            .created_at
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO documents \
                 (filename, stored_filename, file_path, vector_store_path, content_hash, chunk_count, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![
                doc.filename,
                doc.stored_filename,
                doc.file_path,
                doc.vector_store_path,
                doc.content_hash,
                doc.chunk_count as i64,
                created_at,
            ])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(id)
    }

    /// Get a document by ID.
    pub fn get_document(&self, doc_id: i64) -> Result<Option<Document>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM documents WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![doc_id], Self::row_to_document)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    /// All documents, newest first.
    pub fn list_documents(&self) -> Result<Vec<Document>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT * FROM documents ORDER BY created_at DESC, id DESC")
            .map_err(|e| Error::Database(e.to_string()))?;
        let docs = stmt
            .query_map([], Self::row_to_document)
            .map_err(|e| Error::Database(e.to_string()))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(docs)
    }

    /// Whether any record already uses `stored_filename`.
    pub fn stored_filename_exists(&self, stored_filename: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let exists = conn
            .prepare_cached("SELECT 1 FROM documents WHERE stored_filename = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .exists(params![stored_filename])
            .map_err(|e| Error::Database(e.to_string()));
        exists
    }

    pub fn count_documents(&self) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))
    }

    fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
        Ok(Document {
            id: row.get("id")?,
            filename: row.get("filename")?,
            stored_filename: row.get("stored_filename")?,
            file_path: row.get("file_path")?,
            vector_store_path: row.get("vector_store_path")?,
            content_hash: row.get("content_hash")?,
            chunk_count: row.get("chunk_count")?,
            created_at: row.get("created_at")?,
        })
    }
}
