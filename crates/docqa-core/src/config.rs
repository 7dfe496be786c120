//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between consecutive chunks, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
/// Default number of passages retrieved per question.
pub const DEFAULT_TOP_K: usize = 3;
/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8000;

/// Paths to all docqa data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Raw uploaded documents (`data/uploads/`).
    pub uploads: PathBuf,
    /// Persisted per-document indexes (`data/vector_stores/`).
    pub vector_stores: PathBuf,
    /// Metadata database directory (`data/db/`).
    pub db: PathBuf,
    /// LLM configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            uploads: root.join("uploads"),
            vector_stores: root.join("vector_stores"),
            db: root.join("db"),
            llm_config_file: root.join("llm-config.json"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.uploads)?;
        std::fs::create_dir_all(&self.vector_stores)?;
        std::fs::create_dir_all(&self.db)?;
        Ok(())
    }

    /// Index location for an uploaded file stored under `stored_filename`.
    pub fn index_path_for(&self, stored_filename: &str) -> PathBuf {
        self.vector_stores.join(format!("{stored_filename}.json"))
    }
}

/// Chunk window parameters, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkingConfig {
    /// `DOCQA_CHUNK_SIZE` / `DOCQA_CHUNK_OVERLAP`, falling back to the defaults.
    pub fn from_env() -> Self {
        Self {
            chunk_size: env_parse("DOCQA_CHUNK_SIZE").unwrap_or(DEFAULT_CHUNK_SIZE),
            chunk_overlap: env_parse("DOCQA_CHUNK_OVERLAP").unwrap_or(DEFAULT_CHUNK_OVERLAP),
        }
    }

    /// Overlap must be strictly smaller than the chunk size.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Top-level docqa configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocQaConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    pub chunking: ChunkingConfig,
    /// Passages retrieved per question.
    pub top_k: usize,
}

impl DocQaConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let port = env_parse("PORT").unwrap_or(DEFAULT_PORT);
        let chunking = ChunkingConfig::from_env();
        let top_k = env_parse("DOCQA_TOP_K").unwrap_or(DEFAULT_TOP_K);

        let data_paths = DataPaths::new(data_dir)?;
        Self::new(port, data_paths, chunking, top_k)
    }

    /// Build a configuration from explicit values, validating them.
    pub fn new(
        port: u16,
        data_paths: DataPaths,
        chunking: ChunkingConfig,
        top_k: usize,
    ) -> Result<Self> {
        chunking.validate()?;
        if top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be at least 1".into()));
        }
        Ok(Self {
            port,
            data_paths,
            chunking,
            top_k,
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {}={:?}", key, raw);
            None
        }
    }
}
