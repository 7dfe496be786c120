//! Versioned on-disk format for a [`VectorIndex`].
//!
//! The bundle is a JSON record tagged with a format version. Saving writes a
//! sibling temporary file and renames it into place, so readers never observe
//! a partially written index.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::index::VectorIndex;
use crate::sparse::SparseVector;
use docqa_core::{Error, Result};

/// Current bundle format. Bundles with any other version are rejected on load.
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Owned, serializable form of a vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexBundle {
    pub version: u32,
    /// Term → column position; interprets both `idf` and `chunk_vectors`.
    pub vocabulary: BTreeMap<String, u32>,
    pub idf: Vec<f32>,
    pub chunk_vectors: Vec<SparseVector>,
    pub chunk_texts: Vec<String>,
}

/// Borrowed view used when saving, to avoid cloning the index.
#[derive(Serialize)]
struct BundleView<'a> {
    version: u32,
    vocabulary: &'a BTreeMap<String, u32>,
    idf: &'a [f32],
    chunk_vectors: &'a [SparseVector],
    chunk_texts: &'a [String],
}

#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

impl From<VectorIndex> for IndexBundle {
    fn from(index: VectorIndex) -> Self {
        Self {
            version: INDEX_FORMAT_VERSION,
            vocabulary: index.vocabulary().clone(),
            idf: index.idf().to_vec(),
            chunk_vectors: index.chunk_vectors().to_vec(),
            chunk_texts: index.chunk_texts().to_vec(),
        }
    }
}

impl TryFrom<IndexBundle> for VectorIndex {
    type Error = Error;

    fn try_from(bundle: IndexBundle) -> Result<Self> {
        if bundle.version != INDEX_FORMAT_VERSION {
            return Err(Error::CorruptIndex(format!(
                "unsupported index format version {} (expected {})",
                bundle.version, INDEX_FORMAT_VERSION
            )));
        }
        VectorIndex::from_parts(
            bundle.vocabulary,
            bundle.idf,
            bundle.chunk_vectors,
            bundle.chunk_texts,
        )
        .map_err(Error::CorruptIndex)
    }
}

impl VectorIndex {
    /// Persist the index at `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Persistence(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let view = BundleView {
            version: INDEX_FORMAT_VERSION,
            vocabulary: self.vocabulary(),
            idf: self.idf(),
            chunk_vectors: self.chunk_vectors(),
            chunk_texts: self.chunk_texts(),
        };
        let bytes = serde_json::to_vec(&view)
            .map_err(|e| Error::Persistence(format!("cannot encode index: {}", e)))?;

        let tmp = tmp_path(path);
        if let Err(e) = std::fs::write(&tmp, &bytes) {
            let _ = std::fs::remove_file(&tmp);
            return Err(Error::Persistence(format!(
                "cannot write {}: {}",
                tmp.display(),
                e
            )));
        }
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(Error::Persistence(format!(
                "cannot move index into {}: {}",
                path.display(),
                e
            )));
        }

        info!(
            "Saved index ({} chunks, {} terms, {} bytes) to {}",
            self.len(),
            self.vocabulary().len(),
            bytes.len(),
            path.display()
        );
        Ok(())
    }

    /// Load an index previously written by [`VectorIndex::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::IndexNotFound(path.display().to_string()),
            _ => Error::CorruptIndex(format!("cannot read {}: {}", path.display(), e)),
        })?;

        let header: VersionHeader = serde_json::from_slice(&bytes).map_err(|e| {
            Error::CorruptIndex(format!("{} is not an index bundle: {}", path.display(), e))
        })?;
        if header.version != INDEX_FORMAT_VERSION {
            return Err(Error::CorruptIndex(format!(
                "{} has format version {} (expected {})",
                path.display(),
                header.version,
                INDEX_FORMAT_VERSION
            )));
        }

        let bundle: IndexBundle = serde_json::from_slice(&bytes).map_err(|e| {
            Error::CorruptIndex(format!("cannot decode {}: {}", path.display(), e))
        })?;
        let index = VectorIndex::try_from(bundle)?;
        debug!("Loaded index with {} chunks from {}", index.len(), path.display());
        Ok(index)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> VectorIndex {
        VectorIndex::build([
            "Rust guarantees memory safety without a garbage collector.",
            "The borrow checker enforces ownership rules at compile time.",
            "Cargo builds crates and resolves dependencies.",
        ])
        .unwrap()
    }

    #[test]
    fn test_save_load_preserves_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/stores/doc.pdf.json");
        let index = sample();
        index.save(&path).unwrap();

        let loaded = VectorIndex::load(&path).unwrap();
        assert_eq!(loaded.chunk_texts(), index.chunk_texts());
        assert_eq!(loaded.vocabulary(), index.vocabulary());
        assert_eq!(loaded.idf(), index.idf());
        assert_eq!(
            loaded.search("borrow ownership", 3).unwrap(),
            index.search("borrow ownership", 3).unwrap()
        );
        assert!(!dir.path().join("nested/stores/doc.pdf.json.tmp").exists());
    }

    #[test]
    fn test_missing_index() {
        let dir = TempDir::new().unwrap();
        let err = VectorIndex::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::IndexNotFound(_)));
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"\x80not json").unwrap();
        assert!(matches!(
            VectorIndex::load(&path),
            Err(Error::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_version_mismatch_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("old.json");
        let mut bundle = IndexBundle::from(sample());
        bundle.version = INDEX_FORMAT_VERSION + 1;
        std::fs::write(&path, serde_json::to_vec(&bundle).unwrap()).unwrap();

        match VectorIndex::load(&path) {
            Err(Error::CorruptIndex(msg)) => assert!(msg.contains("version")),
            other => panic!("Expected CorruptIndex, got {other:?}"),
        }
    }

    #[test]
    fn test_inconsistent_bundle_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.json");
        let mut bundle = IndexBundle::from(sample());
        bundle.chunk_texts.pop();
        std::fs::write(&path, serde_json::to_vec(&bundle).unwrap()).unwrap();
        assert!(matches!(
            VectorIndex::load(&path),
            Err(Error::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_unwritable_location() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"a file, not a directory").unwrap();
        let err = sample().save(blocker.join("index.json")).unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }

    #[test]
    fn test_bundle_roundtrip_through_type() {
        let index = sample();
        let back = VectorIndex::try_from(IndexBundle::from(index.clone())).unwrap();
        assert_eq!(back, index);
    }
}
