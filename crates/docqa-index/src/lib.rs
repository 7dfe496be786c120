//! docqa index: per-document TF-IDF vector index and retriever.
//!
//! An index is built once from a document's chunks, persisted as a versioned
//! bundle, and loaded fresh for every query. Vocabulary and idf weights are
//! frozen at build time.

pub mod bundle;
pub mod index;
pub mod retriever;
pub mod sparse;
pub mod tokenize;

pub use bundle::{IndexBundle, INDEX_FORMAT_VERSION};
pub use index::{ScoredChunk, VectorIndex};
pub use retriever::Retriever;
pub use sparse::SparseVector;
