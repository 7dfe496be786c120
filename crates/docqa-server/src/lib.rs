//! docqa server: HTTP routes, shared state and CLI helpers.

pub mod cli;
pub mod error;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::{AnswerBackend, AppState};
