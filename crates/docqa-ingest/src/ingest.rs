//! Document ingestion pipeline: upload → text → chunks → index → record.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::chunking::RecursiveChunker;
use crate::extract::extract_pdf_text;
use docqa_core::config::{ChunkingConfig, DataPaths};
use docqa_core::{Error, Result};
use docqa_index::VectorIndex;
use docqa_store::{NewDocument, SqliteStore};

/// Counter-suffixed names tried after the plain and timestamped ones.
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Result of a successful ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub document_id: i64,
    /// Name the upload was stored under in the uploads directory.
    pub stored_filename: String,
    pub chunk_count: usize,
    pub index_path: PathBuf,
}

/// Turns uploads into persisted indexes plus metadata records.
pub struct Ingester<'a> {
    store: &'a SqliteStore,
    paths: &'a DataPaths,
    chunker: RecursiveChunker,
}

impl<'a> Ingester<'a> {
    pub fn new(
        store: &'a SqliteStore,
        paths: &'a DataPaths,
        chunking: &ChunkingConfig,
    ) -> Result<Self> {
        Ok(Self {
            store,
            paths,
            chunker: RecursiveChunker::from_config(chunking)?,
        })
    }

    /// Store a PDF upload, index its text and record it.
    ///
    /// On failure nothing is left behind: the stored upload and the claimed
    /// index location are removed again.
    pub fn ingest_pdf(&self, filename: &str, bytes: &[u8]) -> Result<IngestOutcome> {
        let reservation = self.reserve(filename, bytes)?;

        let outcome = extract_pdf_text(bytes)
            .and_then(|text| self.index_and_record(filename, &reservation, &text, bytes));
        if outcome.is_err() {
            reservation.release();
        }
        outcome
    }

    /// Store already-extracted text as an upload, index it and record it.
    pub fn ingest_text(&self, filename: &str, text: &str) -> Result<IngestOutcome> {
        let reservation = self.reserve(filename, text.as_bytes())?;

        let outcome = self.index_and_record(filename, &reservation, text, text.as_bytes());
        if outcome.is_err() {
            reservation.release();
        }
        outcome
    }

    fn index_and_record(
        &self,
        filename: &str,
        reservation: &Reservation,
        text: &str,
        raw: &[u8],
    ) -> Result<IngestOutcome> {
        let Reservation {
            stored_filename,
            upload_path,
            index_path,
        } = reservation;

        let outcome = (|| -> Result<IngestOutcome> {
            let index = VectorIndex::build(self.chunker.chunks(text).map(|c| c.text))?;
            let chunk_count = index.len();
            index.save(index_path)?;

            let document_id = self.store.add_document(&NewDocument {
                filename: filename.to_string(),
                stored_filename: stored_filename.clone(),
                file_path: upload_path.to_string_lossy().into_owned(),
                vector_store_path: index_path.to_string_lossy().into_owned(),
                content_hash: content_hash(raw),
                chunk_count,
                created_at: None,
            })?;
            Ok(IngestOutcome {
                document_id,
                stored_filename: stored_filename.clone(),
                chunk_count,
                index_path: index_path.clone(),
            })
        })();

        match &outcome {
            Ok(o) => info!(
                "Ingested document {} ({} as {}) with {} chunks",
                o.document_id, filename, stored_filename, o.chunk_count
            ),
            Err(e) => warn!("Ingestion of {} failed: {}", filename, e),
        }
        outcome
    }

    /// Claim a fresh stored name and write `bytes` under it.
    ///
    /// A name is usable only when no record refers to it and both the upload
    /// file and the index file can be created new, so a name whose upload has
    /// gone missing never reuses that document's index location.
    fn reserve(&self, filename: &str, bytes: &[u8]) -> Result<Reservation> {
        let safe = sanitize_filename(filename);
        let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S").to_string();

        let candidates = std::iter::once(safe.clone())
            .chain(std::iter::once(suffixed(&safe, &stamp)))
            .chain((1..=MAX_NAME_ATTEMPTS).map(|n| suffixed(&safe, &format!("{stamp}_{n}"))));

        for name in candidates {
            if self.store.stored_filename_exists(&name)? {
                debug!("Stored name {} already recorded", name);
                continue;
            }

            let upload_path = self.paths.uploads.join(&name);
            let Some(mut upload) = create_new(&upload_path)? else {
                debug!("Upload name {} taken", name);
                continue;
            };
            let index_path = self.paths.index_path_for(&name);
            match create_new(&index_path) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    debug!("Index location for {} taken", name);
                    drop(upload);
                    remove_quietly(&upload_path);
                    continue;
                }
                Err(e) => {
                    drop(upload);
                    remove_quietly(&upload_path);
                    return Err(e);
                }
            }

            let reservation = Reservation {
                stored_filename: name,
                upload_path,
                index_path,
            };
            if let Err(e) = upload.write_all(bytes).and_then(|_| upload.sync_all()) {
                reservation.release();
                return Err(Error::Persistence(format!(
                    "cannot write {}: {}",
                    reservation.upload_path.display(),
                    e
                )));
            }
            return Ok(reservation);
        }
        Err(Error::Persistence(format!("no free upload name for {safe}")))
    }
}

/// Upload file and index location claimed for one ingestion.
struct Reservation {
    stored_filename: String,
    upload_path: PathBuf,
    index_path: PathBuf,
}

impl Reservation {
    fn release(&self) {
        remove_quietly(&self.upload_path);
        remove_quietly(&self.index_path);
    }
}

/// Create `path` only if it does not exist yet; `None` when it does.
fn create_new(path: &Path) -> Result<Option<File>> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => Ok(Some(f)),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(Error::Persistence(format!(
            "cannot create {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Strip directory components so an upload cannot escape the uploads directory.
fn sanitize_filename(name: &str) -> String {
    let name = name.replace(['/', '\\'], "").replace("..", "");
    Path::new(&name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string()
}

/// `report.pdf` + `x` → `report_x.pdf`.
fn suffixed(name: &str, suffix: &str) -> String {
    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_{suffix}.{ext}"),
        None => format!("{stem}_{suffix}"),
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}

/// SHA-256 of the raw upload, hex-encoded.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_index::Retriever;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        paths: DataPaths,
        store: SqliteStore,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let paths = DataPaths::new(dir.path()).unwrap();
        let store = SqliteStore::open(&paths.db).unwrap();
        Fixture {
            _dir: dir,
            paths,
            store,
        }
    }

    fn small_chunks() -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: 40,
            chunk_overlap: 10,
        }
    }

    fn dir_len(path: &Path) -> usize {
        std::fs::read_dir(path).unwrap().count()
    }

    #[test]
    fn test_ingest_text_indexes_and_records() {
        let fx = fixture();
        let ingester = Ingester::new(&fx.store, &fx.paths, &small_chunks()).unwrap();
        let text = "Cats sleep most of the day.\n\nDogs prefer long walks in the park.\n\nBirds sing at dawn.";

        let outcome = ingester.ingest_text("animals.txt", text).unwrap();
        assert_eq!(outcome.stored_filename, "animals.txt");
        assert_eq!(outcome.index_path, fx.paths.vector_stores.join("animals.txt.json"));
        assert!(outcome.chunk_count >= 3);

        let doc = fx.store.get_document(outcome.document_id).unwrap().unwrap();
        assert_eq!(doc.chunk_count as usize, outcome.chunk_count);
        assert_eq!(doc.content_hash, content_hash(text.as_bytes()));
        assert_eq!(std::fs::read_to_string(&doc.file_path).unwrap(), text);

        let best = Retriever::search(&doc.vector_store_path, "where do dogs walk", 1).unwrap();
        assert!(best[0].contains("Dogs"));
    }

    #[test]
    fn test_same_filename_gets_distinct_locations() {
        let fx = fixture();
        let ingester = Ingester::new(&fx.store, &fx.paths, &small_chunks()).unwrap();

        let first = ingester.ingest_text("doc.txt", "first upload text").unwrap();
        let second = ingester.ingest_text("doc.txt", "second upload text").unwrap();
        let third = ingester.ingest_text("doc.txt", "third upload text").unwrap();

        assert_ne!(first.stored_filename, second.stored_filename);
        assert_ne!(second.stored_filename, third.stored_filename);
        assert_ne!(first.index_path, third.index_path);
        assert!(second.stored_filename.starts_with("doc_"));
        assert!(second.stored_filename.ends_with(".txt"));

        let hits = Retriever::search(&first.index_path, "upload", 1).unwrap();
        assert_eq!(hits, vec!["first upload text".to_string()]);
        assert_eq!(fx.store.count_documents().unwrap(), 3);
    }

    #[test]
    fn test_empty_text_leaves_nothing_behind() {
        let fx = fixture();
        let ingester = Ingester::new(&fx.store, &fx.paths, &small_chunks()).unwrap();

        let err = ingester.ingest_text("empty.txt", "").unwrap_err();
        assert!(matches!(err, Error::EmptyCorpus));
        assert_eq!(dir_len(&fx.paths.uploads), 0);
        assert_eq!(dir_len(&fx.paths.vector_stores), 0);
        assert_eq!(fx.store.count_documents().unwrap(), 0);
    }

    #[test]
    fn test_unreadable_pdf_is_rolled_back() {
        let fx = fixture();
        let ingester = Ingester::new(&fx.store, &fx.paths, &ChunkingConfig::default()).unwrap();

        let err = ingester.ingest_pdf("broken.pdf", b"not a pdf at all").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
        assert_eq!(dir_len(&fx.paths.uploads), 0);
        assert_eq!(dir_len(&fx.paths.vector_stores), 0);
        assert_eq!(fx.store.count_documents().unwrap(), 0);
    }

    #[test]
    fn test_recorded_name_is_not_reused_when_upload_is_gone() {
        let fx = fixture();
        let ingester = Ingester::new(&fx.store, &fx.paths, &small_chunks()).unwrap();

        let first = ingester.ingest_text("notes.txt", "original indexed words").unwrap();
        let doc = fx.store.get_document(first.document_id).unwrap().unwrap();
        std::fs::remove_file(&doc.file_path).unwrap();
        let saved = std::fs::read(&first.index_path).unwrap();

        let second = ingester.ingest_text("notes.txt", "replacement upload").unwrap();
        assert_ne!(second.stored_filename, first.stored_filename);
        assert_ne!(second.index_path, first.index_path);
        assert_eq!(std::fs::read(&first.index_path).unwrap(), saved);

        let hits = Retriever::search(&doc.vector_store_path, "original", 1).unwrap();
        assert_eq!(hits, vec!["original indexed words".to_string()]);
        assert_eq!(fx.store.count_documents().unwrap(), 2);
    }

    #[test]
    fn test_existing_index_file_is_not_overwritten() {
        let fx = fixture();
        let stray = fx.paths.index_path_for("report.txt");
        std::fs::write(&stray, b"left over").unwrap();
        let ingester = Ingester::new(&fx.store, &fx.paths, &small_chunks()).unwrap();

        let outcome = ingester.ingest_text("report.txt", "quarterly figures").unwrap();
        assert_ne!(outcome.stored_filename, "report.txt");
        assert_eq!(std::fs::read(&stray).unwrap(), b"left over");
        assert_eq!(dir_len(&fx.paths.uploads), 1);
    }

    #[test]
    fn test_invalid_chunking_rejected() {
        let fx = fixture();
        let bad = ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 10,
        };
        assert!(matches!(
            Ingester::new(&fx.store, &fx.paths, &bad),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_filename("dir\\report.pdf"), "dirreport.pdf");
        assert_eq!(sanitize_filename(""), "unnamed");
        assert_eq!(suffixed("report.pdf", "x"), "report_x.pdf");
        assert_eq!(suffixed("README", "x"), "README_x");
    }

    #[test]
    fn test_content_hash() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
