//! Shared application state.

use std::sync::Arc;

use docqa_chat::{AnswerService, LLMConfig, LLMProvider, LlmAnswerService};
use docqa_core::{DocQaConfig, Result};
use docqa_store::SqliteStore;
use tracing::{info, warn};

/// The configured answer generator and what it talks to.
#[derive(Clone)]
pub struct AnswerBackend {
    pub service: Arc<dyn AnswerService>,
    pub provider: LLMProvider,
    pub model: String,
}

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: DocQaConfig,
    pub store: SqliteStore,
    /// `None` when no LLM provider has an API key.
    pub answer: Option<AnswerBackend>,
}

impl AppState {
    pub fn new(config: DocQaConfig, store: SqliteStore, answer: Option<AnswerBackend>) -> Self {
        Self {
            config,
            store,
            answer,
        }
    }

    /// Open the metadata store and build the answer service from `llm-config.json`.
    pub fn open(config: DocQaConfig) -> Result<Self> {
        let store = SqliteStore::open(&config.data_paths.db)?;

        let llm_config = LLMConfig::load(&config.data_paths.llm_config_file);
        let answer = match llm_config.resolve_provider() {
            Some(resolved) => {
                info!("Answer service: {} ({})", resolved.provider, resolved.model);
                Some(AnswerBackend {
                    provider: resolved.provider,
                    model: resolved.model.clone(),
                    service: Arc::new(LlmAnswerService::new(resolved)),
                })
            }
            None => {
                warn!("No LLM provider configured; /ask-question will answer 503");
                None
            }
        };

        Ok(Self::new(config, store, answer))
    }
}
