//! docqa store: SQLite records mapping documents to their raw file and index.

pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::SqliteStore;
pub use types::*;
