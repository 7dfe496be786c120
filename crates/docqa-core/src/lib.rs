//! docqa core: error taxonomy, configuration, data directory layout.

pub mod config;
pub mod error;

pub use config::{ChunkingConfig, DataPaths, DocQaConfig};
pub use error::{Error, Result};
