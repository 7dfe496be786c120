//! docqa ingest: text extraction, chunking, and document ingestion.

pub mod chunking;
pub mod extract;
pub mod ingest;

pub use chunking::{split_text_into_chunks, Chunks, RecursiveChunker, TextChunk};
pub use extract::{extract_pdf_file, extract_pdf_text, FileType};
pub use ingest::{content_hash, IngestOutcome, Ingester};
