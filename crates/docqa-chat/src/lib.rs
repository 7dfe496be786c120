//! Answer generation for retrieved context via external LLM APIs.
//!
//! The server only sees the [`AnswerService`] trait; [`LlmAnswerService`]
//! is the production implementation built once from [`LLMConfig`].

pub mod config;
pub mod providers;
pub mod types;

pub use config::{LLMConfig, ResolvedProvider};
pub use providers::{build_context, build_messages, AnswerService, LlmAnswerService, SYSTEM_PROMPT};
pub use types::*;
