//! Offline subcommands: build an index from a PDF, search a saved index.

use std::path::Path;

use tracing::info;

use docqa_core::{ChunkingConfig, Result};
use docqa_index::{Retriever, ScoredChunk, VectorIndex};
use docqa_ingest::{extract_pdf_file, RecursiveChunker};

pub const USAGE: &str = "\
docqa: ask questions about uploaded PDFs

Usage: docqa [command]

Commands:
  (none)                           Start the HTTP server
  index <pdf> <out.json>           Build and save an index from a PDF
  search <index.json> <query> [k]  Print the k best chunks (default 3)
  help                             Show this help message

Environment:
  PORT, DOCQA_DATA_DIR, DOCQA_CHUNK_SIZE, DOCQA_CHUNK_OVERLAP, DOCQA_TOP_K";

/// Extract, chunk and index `pdf`, saving the bundle to `out`.
/// Returns the number of chunks indexed.
pub fn index_pdf(pdf: &Path, out: &Path, chunking: &ChunkingConfig) -> Result<usize> {
    let text = extract_pdf_file(pdf)?;
    let chunker = RecursiveChunker::from_config(chunking)?;
    let index = VectorIndex::build(chunker.chunks(&text).map(|c| c.text))?;
    index.save(out)?;
    info!("Indexed {} into {} chunks", pdf.display(), index.len());
    Ok(index.len())
}

/// Ranked chunks of a saved index, best first.
pub fn search_index(index: &Path, query: &str, top_k: usize) -> Result<Vec<ScoredChunk>> {
    Retriever::search_scored(index, query, top_k)
}

/// One line per hit: rank, score, chunk position and a single-line excerpt.
pub fn format_hits(hits: &[ScoredChunk]) -> String {
    hits.iter()
        .enumerate()
        .map(|(rank, hit)| {
            let excerpt: String = hit
                .text
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .chars()
                .take(160)
                .collect();
            format!(
                "{}. [{:.4}] chunk {}: {}",
                rank + 1,
                hit.score,
                hit.chunk_index,
                excerpt
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
