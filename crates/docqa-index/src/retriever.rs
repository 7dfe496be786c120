//! Load a persisted index and rank its chunks against a query.

use std::path::Path;

use tracing::debug;

use crate::index::{ScoredChunk, VectorIndex};
use docqa_core::{Error, Result};

/// Stateless retriever. Every call loads the index fresh from storage.
pub struct Retriever;

impl Retriever {
    /// Top-`top_k` chunks with scores and positions, best first.
    pub fn search_scored(
        index_path: impl AsRef<Path>,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        if top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be at least 1".into()));
        }
        let index_path = index_path.as_ref();
        let index = VectorIndex::load(index_path)?;
        let hits = index.search(query, top_k)?;
        debug!(
            "Retrieved {} of {} chunks from {}",
            hits.len(),
            index.len(),
            index_path.display()
        );
        Ok(hits)
    }

    /// Top-`top_k` chunk texts, best first.
    pub fn search(
        index_path: impl AsRef<Path>,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<String>> {
        Ok(Self::search_scored(index_path, query, top_k)?
            .into_iter()
            .map(|hit| hit.text)
            .collect())
    }
}
